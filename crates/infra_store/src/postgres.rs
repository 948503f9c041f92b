//! PostgreSQL store adapter
//!
//! Implements the ledger and occupancy store ports over a SQLx pool. Writes
//! that the ports require to be atomic run inside one transaction, and every
//! update carries an optimistic version predicate: `WHERE id = $1 AND
//! version = $2` with `version = version + 1` in the SET list. Zero rows
//! affected means either a missing row or a lost version race; the adapter
//! re-checks existence to report the right one.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::{FromRow, Postgres, Transaction};
use uuid::Uuid;

use core_kernel::{
    BillingId, BillingPeriod, Currency, InvoiceId, Money, PaymentId, ResidentId, RoomId,
    StoreError,
};
use domain_ledger::{
    BillableResident, Billing, BillingStatus, ChargeBreakdown, Invoice, InvoiceStatus,
    LedgerStore, Payment, PaymentMethod, PaymentStatus,
};
use domain_occupancy::{OccupancyStore, ResidencyStatus, Resident, Room, RoomStatus, RoomType};

use crate::error::map_sqlx;

/// SQLx-backed implementation of the ledger and occupancy store ports
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_currency(code: &str) -> Result<Currency, StoreError> {
    Currency::from_str(code).map_err(|e| StoreError::internal(format!("stored currency: {e}")))
}

fn corrupt(field: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::internal(format!("stored {field}: {err}"))
}

#[derive(FromRow)]
struct BillingRow {
    id: Uuid,
    resident_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    room_fee: Decimal,
    utilities_fee: Decimal,
    additional_services_fee: Decimal,
    discount_amount: Decimal,
    late_fee: Decimal,
    total_amount: Decimal,
    currency: String,
    status: String,
    generated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BillingRow {
    fn into_domain(self) -> Result<Billing, StoreError> {
        let currency = parse_currency(&self.currency)?;
        Ok(Billing {
            id: BillingId::from(self.id),
            resident_id: ResidentId::from(self.resident_id),
            period: BillingPeriod::new(self.period_start, self.period_end)
                .map_err(|e| corrupt("billing period", e))?,
            charges: ChargeBreakdown {
                room_fee: Money::new(self.room_fee, currency),
                utilities_fee: Money::new(self.utilities_fee, currency),
                additional_services_fee: Money::new(self.additional_services_fee, currency),
                discount_amount: Money::new(self.discount_amount, currency),
                late_fee: Money::new(self.late_fee, currency),
            },
            total_amount: Money::new(self.total_amount, currency),
            status: BillingStatus::from_str(&self.status)
                .map_err(|e| corrupt("billing status", e))?,
            generated_at: self.generated_at,
            paid_at: self.paid_at,
            notes: self.notes,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct InvoiceRow {
    id: Uuid,
    billing_id: Uuid,
    resident_id: Uuid,
    invoice_number: String,
    total_amount: Decimal,
    currency: String,
    status: String,
    issued_at: DateTime<Utc>,
    due_date: NaiveDate,
    paid_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_domain(self) -> Result<Invoice, StoreError> {
        let currency = parse_currency(&self.currency)?;
        Ok(Invoice {
            id: InvoiceId::from(self.id),
            billing_id: BillingId::from(self.billing_id),
            resident_id: ResidentId::from(self.resident_id),
            invoice_number: self.invoice_number,
            total_amount: Money::new(self.total_amount, currency),
            status: InvoiceStatus::from_str(&self.status)
                .map_err(|e| corrupt("invoice status", e))?,
            issued_at: self.issued_at,
            due_date: self.due_date,
            paid_at: self.paid_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: Uuid,
    billing_id: Uuid,
    resident_id: Uuid,
    amount: Decimal,
    currency: String,
    method: String,
    status: String,
    reference: Option<String>,
    recorded_by: Option<Uuid>,
    notes: Option<String>,
    received_at: DateTime<Utc>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_domain(self) -> Result<Payment, StoreError> {
        let currency = parse_currency(&self.currency)?;
        Ok(Payment {
            id: PaymentId::from(self.id),
            billing_id: BillingId::from(self.billing_id),
            resident_id: ResidentId::from(self.resident_id),
            amount: Money::new(self.amount, currency),
            method: PaymentMethod::from_str(&self.method)
                .map_err(|e| corrupt("payment method", e))?,
            status: PaymentStatus::from_str(&self.status)
                .map_err(|e| corrupt("payment status", e))?,
            reference: self.reference,
            recorded_by: self.recorded_by.map(core_kernel::UserId::from),
            notes: self.notes,
            received_at: self.received_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct RoomRow {
    id: Uuid,
    room_number: String,
    room_type: String,
    capacity: i32,
    price_amount: Decimal,
    price_currency: String,
    status: String,
    occupants: Vec<Uuid>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_domain(self) -> Result<Room, StoreError> {
        let currency = parse_currency(&self.price_currency)?;
        Ok(Room {
            id: RoomId::from(self.id),
            room_number: self.room_number,
            room_type: RoomType::from_str(&self.room_type)
                .map_err(|e| corrupt("room type", e))?,
            capacity: self.capacity as u32,
            price_per_month: Money::new(self.price_amount, currency),
            status: RoomStatus::from_str(&self.status).map_err(|e| corrupt("room status", e))?,
            occupants: self.occupants.into_iter().map(ResidentId::from).collect(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ResidentRow {
    id: Uuid,
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
    status: String,
    room_id: Option<Uuid>,
    checked_in_at: Option<DateTime<Utc>>,
    checked_out_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResidentRow {
    fn into_domain(self) -> Result<Resident, StoreError> {
        Ok(Resident {
            id: ResidentId::from(self.id),
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            status: ResidencyStatus::from_str(&self.status)
                .map_err(|e| corrupt("residency status", e))?,
            room_id: self.room_id.map(RoomId::from),
            checked_in_at: self.checked_in_at,
            checked_out_at: self.checked_out_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const BILLING_COLUMNS: &str = "id, resident_id, period_start, period_end, room_fee, \
     utilities_fee, additional_services_fee, discount_amount, late_fee, total_amount, \
     currency, status, generated_at, paid_at, notes, version, created_at, updated_at";

const INVOICE_COLUMNS: &str = "id, billing_id, resident_id, invoice_number, total_amount, \
     currency, status, issued_at, due_date, paid_at, version, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, billing_id, resident_id, amount, currency, method, status, \
     reference, recorded_by, notes, received_at, version, created_at, updated_at";

const ROOM_COLUMNS: &str = "id, room_number, room_type, capacity, price_amount, \
     price_currency, status, occupants, version, created_at, updated_at";

const RESIDENT_COLUMNS: &str = "id, full_name, email, phone, status, room_id, checked_in_at, \
     checked_out_at, version, created_at, updated_at";

async fn update_billing_tx(
    tx: &mut Transaction<'_, Postgres>,
    billing: &Billing,
    expected_version: i64,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "UPDATE billings SET status = $3, paid_at = $4, notes = $5, updated_at = $6, \
         version = version + 1 WHERE id = $1 AND version = $2",
    )
    .bind(Uuid::from(billing.id))
    .bind(expected_version)
    .bind(billing.status.as_str())
    .bind(billing.paid_at)
    .bind(&billing.notes)
    .bind(billing.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(result.rows_affected())
}

async fn update_invoice_tx(
    tx: &mut Transaction<'_, Postgres>,
    invoice: &Invoice,
    expected_version: i64,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "UPDATE invoices SET status = $3, paid_at = $4, updated_at = $5, \
         version = version + 1 WHERE id = $1 AND version = $2",
    )
    .bind(Uuid::from(invoice.id))
    .bind(expected_version)
    .bind(invoice.status.as_str())
    .bind(invoice.paid_at)
    .bind(invoice.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(result.rows_affected())
}

impl PgStore {
    /// Distinguishes a lost version race from a missing row after a
    /// zero-rows-affected update
    async fn classify_miss(
        &self,
        table: &str,
        entity: &str,
        id: Uuid,
    ) -> Result<StoreError, StoreError> {
        let exists: Option<(i64,)> =
            sqlx::query_as(&format!("SELECT version FROM {table} WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
        Ok(match exists {
            Some(_) => StoreError::version_conflict(entity, id),
            None => StoreError::not_found(entity, id),
        })
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn insert_billing(&self, billing: &Billing) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO billings (id, resident_id, period_start, period_end, room_fee, \
             utilities_fee, additional_services_fee, discount_amount, late_fee, total_amount, \
             currency, status, generated_at, paid_at, notes, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18)",
        )
        .bind(Uuid::from(billing.id))
        .bind(Uuid::from(billing.resident_id))
        .bind(billing.period.start)
        .bind(billing.period.end)
        .bind(billing.charges.room_fee.amount())
        .bind(billing.charges.utilities_fee.amount())
        .bind(billing.charges.additional_services_fee.amount())
        .bind(billing.charges.discount_amount.amount())
        .bind(billing.charges.late_fee.amount())
        .bind(billing.total_amount.amount())
        .bind(billing.total_amount.currency().code())
        .bind(billing.status.as_str())
        .bind(billing.generated_at)
        .bind(billing.paid_at)
        .bind(&billing.notes)
        .bind(billing.version)
        .bind(billing.created_at)
        .bind(billing.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn billing(&self, id: BillingId) -> Result<Billing, StoreError> {
        let row: Option<BillingRow> =
            sqlx::query_as(&format!("SELECT {BILLING_COLUMNS} FROM billings WHERE id = $1"))
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
        row.ok_or_else(|| StoreError::not_found("Billing", id))?
            .into_domain()
    }

    async fn update_billing(
        &self,
        billing: &Billing,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let affected = update_billing_tx(&mut tx, billing, expected_version).await?;
        if affected == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(self
                .classify_miss("billings", "Billing", Uuid::from(billing.id))
                .await?);
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn billing_for_period(
        &self,
        resident_id: ResidentId,
        period_start: NaiveDate,
    ) -> Result<Option<Billing>, StoreError> {
        let row: Option<BillingRow> = sqlx::query_as(&format!(
            "SELECT {BILLING_COLUMNS} FROM billings WHERE resident_id = $1 AND period_start = $2"
        ))
        .bind(Uuid::from(resident_id))
        .bind(period_start)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(BillingRow::into_domain).transpose()
    }

    async fn billings_for_resident(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<Billing>, StoreError> {
        let rows: Vec<BillingRow> = sqlx::query_as(&format!(
            "SELECT {BILLING_COLUMNS} FROM billings WHERE resident_id = $1 ORDER BY period_start"
        ))
        .bind(Uuid::from(resident_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(BillingRow::into_domain).collect()
    }

    async fn billings_with_status(
        &self,
        status: BillingStatus,
    ) -> Result<Vec<Billing>, StoreError> {
        let rows: Vec<BillingRow> = sqlx::query_as(&format!(
            "SELECT {BILLING_COLUMNS} FROM billings WHERE status = $1 ORDER BY period_start"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(BillingRow::into_domain).collect()
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO invoices (id, billing_id, resident_id, invoice_number, total_amount, \
             currency, status, issued_at, due_date, paid_at, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(Uuid::from(invoice.id))
        .bind(Uuid::from(invoice.billing_id))
        .bind(Uuid::from(invoice.resident_id))
        .bind(&invoice.invoice_number)
        .bind(invoice.total_amount.amount())
        .bind(invoice.total_amount.currency().code())
        .bind(invoice.status.as_str())
        .bind(invoice.issued_at)
        .bind(invoice.due_date)
        .bind(invoice.paid_at)
        .bind(invoice.version)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn invoice(&self, id: InvoiceId) -> Result<Invoice, StoreError> {
        let row: Option<InvoiceRow> =
            sqlx::query_as(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"))
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
        row.ok_or_else(|| StoreError::not_found("Invoice", id))?
            .into_domain()
    }

    async fn update_invoice(
        &self,
        invoice: &Invoice,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let affected = update_invoice_tx(&mut tx, invoice, expected_version).await?;
        if affected == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(self
                .classify_miss("invoices", "Invoice", Uuid::from(invoice.id))
                .await?);
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn invoice_for_billing(
        &self,
        billing_id: BillingId,
    ) -> Result<Option<Invoice>, StoreError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE billing_id = $1"
        ))
        .bind(Uuid::from(billing_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(InvoiceRow::into_domain).transpose()
    }

    async fn invoices_with_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, StoreError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE status = $1 ORDER BY due_date"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(InvoiceRow::into_domain).collect()
    }

    async fn payment(&self, id: PaymentId) -> Result<Payment, StoreError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
        row.ok_or_else(|| StoreError::not_found("Payment", id))?
            .into_domain()
    }

    async fn update_payment(
        &self,
        payment: &Payment,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE payments SET status = $3, notes = $4, updated_at = $5, \
             version = version + 1 WHERE id = $1 AND version = $2",
        )
        .bind(Uuid::from(payment.id))
        .bind(expected_version)
        .bind(payment.status.as_str())
        .bind(&payment.notes)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(self
                .classify_miss("payments", "Payment", Uuid::from(payment.id))
                .await?);
        }
        Ok(())
    }

    async fn payments_for_billing(
        &self,
        billing_id: BillingId,
    ) -> Result<Vec<Payment>, StoreError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE billing_id = $1 ORDER BY received_at"
        ))
        .bind(Uuid::from(billing_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(PaymentRow::into_domain).collect()
    }

    async fn apply_payment(
        &self,
        payment: &Payment,
        billing: &Billing,
        invoice: Option<&Invoice>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        sqlx::query(
            "INSERT INTO payments (id, billing_id, resident_id, amount, currency, method, \
             status, reference, recorded_by, notes, received_at, version, created_at, \
             updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(Uuid::from(payment.id))
        .bind(Uuid::from(payment.billing_id))
        .bind(Uuid::from(payment.resident_id))
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.reference)
        .bind(payment.recorded_by.map(Uuid::from))
        .bind(&payment.notes)
        .bind(payment.received_at)
        .bind(payment.version)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let affected = update_billing_tx(&mut tx, billing, billing.version).await?;
        if affected == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(self
                .classify_miss("billings", "Billing", Uuid::from(billing.id))
                .await?);
        }

        if let Some(invoice) = invoice {
            let affected = update_invoice_tx(&mut tx, invoice, invoice.version).await?;
            if affected == 0 {
                tx.rollback().await.map_err(map_sqlx)?;
                return Err(self
                    .classify_miss("invoices", "Invoice", Uuid::from(invoice.id))
                    .await?);
            }
        }

        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn billable_residents(&self) -> Result<Vec<BillableResident>, StoreError> {
        #[derive(FromRow)]
        struct BillableRow {
            resident_id: Uuid,
            room_id: Uuid,
            price_amount: Decimal,
            price_currency: String,
        }

        let rows: Vec<BillableRow> = sqlx::query_as(
            "SELECT r.id AS resident_id, rm.id AS room_id, rm.price_amount, rm.price_currency \
             FROM residents r JOIN rooms rm ON r.room_id = rm.id \
             WHERE r.status = 'checked-in' ORDER BY rm.room_number",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter()
            .map(|row| {
                let currency = parse_currency(&row.price_currency)?;
                Ok(BillableResident {
                    resident_id: ResidentId::from(row.resident_id),
                    room_id: RoomId::from(row.room_id),
                    monthly_rate: Money::new(row.price_amount, currency),
                })
            })
            .collect()
    }
}

async fn update_resident_tx(
    tx: &mut Transaction<'_, Postgres>,
    resident: &Resident,
    expected_version: i64,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "UPDATE residents SET full_name = $3, email = $4, phone = $5, status = $6, \
         room_id = $7, checked_in_at = $8, checked_out_at = $9, updated_at = $10, \
         version = version + 1 WHERE id = $1 AND version = $2",
    )
    .bind(Uuid::from(resident.id))
    .bind(expected_version)
    .bind(&resident.full_name)
    .bind(&resident.email)
    .bind(&resident.phone)
    .bind(resident.status.as_str())
    .bind(resident.room_id.map(Uuid::from))
    .bind(resident.checked_in_at)
    .bind(resident.checked_out_at)
    .bind(resident.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(result.rows_affected())
}

async fn update_room_tx(
    tx: &mut Transaction<'_, Postgres>,
    room: &Room,
    expected_version: i64,
) -> Result<u64, StoreError> {
    let occupants: Vec<Uuid> = room.occupants.iter().copied().map(Uuid::from).collect();
    let result = sqlx::query(
        "UPDATE rooms SET room_number = $3, room_type = $4, capacity = $5, price_amount = $6, \
         price_currency = $7, status = $8, occupants = $9, updated_at = $10, \
         version = version + 1 WHERE id = $1 AND version = $2",
    )
    .bind(Uuid::from(room.id))
    .bind(expected_version)
    .bind(&room.room_number)
    .bind(room.room_type.as_str())
    .bind(room.capacity as i32)
    .bind(room.price_per_month.amount())
    .bind(room.price_per_month.currency().code())
    .bind(room.status.as_str())
    .bind(&occupants)
    .bind(room.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(result.rows_affected())
}

#[async_trait]
impl OccupancyStore for PgStore {
    async fn insert_room(&self, room: &Room) -> Result<(), StoreError> {
        let occupants: Vec<Uuid> = room.occupants.iter().copied().map(Uuid::from).collect();
        sqlx::query(
            "INSERT INTO rooms (id, room_number, room_type, capacity, price_amount, \
             price_currency, status, occupants, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(Uuid::from(room.id))
        .bind(&room.room_number)
        .bind(room.room_type.as_str())
        .bind(room.capacity as i32)
        .bind(room.price_per_month.amount())
        .bind(room.price_per_month.currency().code())
        .bind(room.status.as_str())
        .bind(&occupants)
        .bind(room.version)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn room(&self, id: RoomId) -> Result<Room, StoreError> {
        let row: Option<RoomRow> =
            sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
        row.ok_or_else(|| StoreError::not_found("Room", id))?
            .into_domain()
    }

    async fn rooms(&self) -> Result<Vec<Room>, StoreError> {
        let rows: Vec<RoomRow> =
            sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY room_number"))
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?;
        rows.into_iter().map(RoomRow::into_domain).collect()
    }

    async fn update_room(&self, room: &Room, expected_version: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let affected = update_room_tx(&mut tx, room, expected_version).await?;
        if affected == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(self.classify_miss("rooms", "Room", Uuid::from(room.id)).await?);
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Room", id));
        }
        Ok(())
    }

    async fn insert_resident(&self, resident: &Resident) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO residents (id, full_name, email, phone, status, room_id, \
             checked_in_at, checked_out_at, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(Uuid::from(resident.id))
        .bind(&resident.full_name)
        .bind(&resident.email)
        .bind(&resident.phone)
        .bind(resident.status.as_str())
        .bind(resident.room_id.map(Uuid::from))
        .bind(resident.checked_in_at)
        .bind(resident.checked_out_at)
        .bind(resident.version)
        .bind(resident.created_at)
        .bind(resident.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn resident(&self, id: ResidentId) -> Result<Resident, StoreError> {
        let row: Option<ResidentRow> =
            sqlx::query_as(&format!("SELECT {RESIDENT_COLUMNS} FROM residents WHERE id = $1"))
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
        row.ok_or_else(|| StoreError::not_found("Resident", id))?
            .into_domain()
    }

    async fn residents(&self) -> Result<Vec<Resident>, StoreError> {
        let rows: Vec<ResidentRow> = sqlx::query_as(&format!(
            "SELECT {RESIDENT_COLUMNS} FROM residents ORDER BY full_name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(ResidentRow::into_domain).collect()
    }

    async fn update_resident(
        &self,
        resident: &Resident,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let affected = update_resident_tx(&mut tx, resident, expected_version).await?;
        if affected == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(self
                .classify_miss("residents", "Resident", Uuid::from(resident.id))
                .await?);
        }
        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn update_pair(&self, resident: &Resident, room: &Room) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let affected = update_resident_tx(&mut tx, resident, resident.version).await?;
        if affected == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(self
                .classify_miss("residents", "Resident", Uuid::from(resident.id))
                .await?);
        }
        let affected = update_room_tx(&mut tx, room, room.version).await?;
        if affected == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(self.classify_miss("rooms", "Room", Uuid::from(room.id)).await?);
        }

        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }
}
