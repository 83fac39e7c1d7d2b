//! Feedback repository

use segint_core::wire::SegmentationFeedback;
use sqlx::PgPool;

/// Insert a feedback message with its per-structure comments in one
/// transaction.
pub async fn insert(pool: &PgPool, feedback: &SegmentationFeedback) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let (feedback_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO feedback
            (client_information, segmentation_id, segmentation_accepted,
             general_comments, general_score)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&feedback.client_information.software_version)
    .bind(&feedback.segmentation_id)
    .bind(feedback.segmentation_accepted)
    .bind(&feedback.general_comments)
    .bind(feedback.general_score)
    .fetch_one(&mut *tx)
    .await?;

    for comment in &feedback.structure_comments {
        sqlx::query(
            r#"
            INSERT INTO structure_comments (feedback_id, structure_id, comments, score)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(feedback_id)
        .bind(&comment.structure_id)
        .bind(&comment.comments)
        .bind(comment.score)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}
