//! Payment rows in `PostgreSQL`.

use parcelpath_core::Payment;
use sqlx::PgExecutor;

/// Insert a payment record.
///
/// # Errors
///
/// Returns `sqlx::Error` if the insert fails.
pub async fn insert_payment<'e>(
    executor: impl PgExecutor<'e>,
    payment: &Payment,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO payments (id, parcel_id, email, amount, transaction_id, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(payment.id)
    .bind(&payment.parcel_id)
    .bind(&payment.email)
    .bind(payment.amount)
    .bind(&payment.transaction_id)
    .bind(payment.status.as_str())
    .bind(payment.created_at)
    .execute(executor)
    .await?;

    Ok(())
}
