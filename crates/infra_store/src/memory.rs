//! In-memory store adapter
//!
//! Backs the domain store ports with plain maps behind a single RwLock.
//! Uniqueness and version semantics match the PostgreSQL adapter, so tests
//! against this store exercise the same conflict paths.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use core_kernel::{BillingId, InvoiceId, PaymentId, ResidentId, RoomId, StoreError};
use domain_ledger::{
    BillableResident, Billing, BillingStatus, Invoice, InvoiceStatus, LedgerStore, Payment,
};
use domain_occupancy::{OccupancyStore, ResidencyStatus, Resident, Room};

#[derive(Default)]
struct Inner {
    rooms: HashMap<RoomId, Room>,
    residents: HashMap<ResidentId, Resident>,
    billings: HashMap<BillingId, Billing>,
    invoices: HashMap<InvoiceId, Invoice>,
    payments: HashMap<PaymentId, Payment>,
}

impl Inner {
    fn check_version(stored: i64, expected: i64, entity: &str, id: String) -> Result<(), StoreError> {
        if stored != expected {
            return Err(StoreError::version_conflict(entity, id));
        }
        Ok(())
    }
}

/// Map-backed implementation of the ledger and occupancy store ports
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for wiring into services
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn insert_billing(&self, billing: &Billing) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.billings.contains_key(&billing.id) {
            return Err(StoreError::conflict(format!(
                "billing {} already exists",
                billing.id
            )));
        }
        let duplicate = inner.billings.values().any(|b| {
            b.resident_id == billing.resident_id && b.period.start == billing.period.start
        });
        if duplicate {
            return Err(StoreError::conflict(format!(
                "resident {} already billed for period starting {}",
                billing.resident_id, billing.period.start
            )));
        }
        inner.billings.insert(billing.id, billing.clone());
        Ok(())
    }

    async fn billing(&self, id: BillingId) -> Result<Billing, StoreError> {
        self.inner
            .read()
            .await
            .billings
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Billing", id))
    }

    async fn update_billing(
        &self,
        billing: &Billing,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .billings
            .get(&billing.id)
            .ok_or_else(|| StoreError::not_found("Billing", billing.id))?;
        Inner::check_version(
            stored.version,
            expected_version,
            "Billing",
            billing.id.to_string(),
        )?;
        let mut updated = billing.clone();
        updated.version = expected_version + 1;
        inner.billings.insert(billing.id, updated);
        Ok(())
    }

    async fn billing_for_period(
        &self,
        resident_id: ResidentId,
        period_start: NaiveDate,
    ) -> Result<Option<Billing>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .billings
            .values()
            .find(|b| b.resident_id == resident_id && b.period.start == period_start)
            .cloned())
    }

    async fn billings_for_resident(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<Billing>, StoreError> {
        let mut bills: Vec<Billing> = self
            .inner
            .read()
            .await
            .billings
            .values()
            .filter(|b| b.resident_id == resident_id)
            .cloned()
            .collect();
        bills.sort_by_key(|b| b.period.start);
        Ok(bills)
    }

    async fn billings_with_status(
        &self,
        status: BillingStatus,
    ) -> Result<Vec<Billing>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .billings
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect())
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.billings.contains_key(&invoice.billing_id) {
            return Err(StoreError::not_found("Billing", invoice.billing_id));
        }
        let duplicate = inner
            .invoices
            .values()
            .any(|i| i.billing_id == invoice.billing_id || i.invoice_number == invoice.invoice_number);
        if duplicate {
            return Err(StoreError::conflict(format!(
                "billing {} already invoiced",
                invoice.billing_id
            )));
        }
        inner.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn invoice(&self, id: InvoiceId) -> Result<Invoice, StoreError> {
        self.inner
            .read()
            .await
            .invoices
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Invoice", id))
    }

    async fn update_invoice(
        &self,
        invoice: &Invoice,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .invoices
            .get(&invoice.id)
            .ok_or_else(|| StoreError::not_found("Invoice", invoice.id))?;
        Inner::check_version(
            stored.version,
            expected_version,
            "Invoice",
            invoice.id.to_string(),
        )?;
        let mut updated = invoice.clone();
        updated.version = expected_version + 1;
        inner.invoices.insert(invoice.id, updated);
        Ok(())
    }

    async fn invoice_for_billing(
        &self,
        billing_id: BillingId,
    ) -> Result<Option<Invoice>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .invoices
            .values()
            .find(|i| i.billing_id == billing_id)
            .cloned())
    }

    async fn invoices_with_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .invoices
            .values()
            .filter(|i| i.status == status)
            .cloned()
            .collect())
    }

    async fn payment(&self, id: PaymentId) -> Result<Payment, StoreError> {
        self.inner
            .read()
            .await
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Payment", id))
    }

    async fn update_payment(
        &self,
        payment: &Payment,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .payments
            .get(&payment.id)
            .ok_or_else(|| StoreError::not_found("Payment", payment.id))?;
        Inner::check_version(
            stored.version,
            expected_version,
            "Payment",
            payment.id.to_string(),
        )?;
        let mut updated = payment.clone();
        updated.version = expected_version + 1;
        inner.payments.insert(payment.id, updated);
        Ok(())
    }

    async fn payments_for_billing(
        &self,
        billing_id: BillingId,
    ) -> Result<Vec<Payment>, StoreError> {
        let mut payments: Vec<Payment> = self
            .inner
            .read()
            .await
            .payments
            .values()
            .filter(|p| p.billing_id == billing_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.received_at);
        Ok(payments)
    }

    async fn apply_payment(
        &self,
        payment: &Payment,
        billing: &Billing,
        invoice: Option<&Invoice>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        let stored_billing = inner
            .billings
            .get(&billing.id)
            .ok_or_else(|| StoreError::not_found("Billing", billing.id))?;
        Inner::check_version(
            stored_billing.version,
            billing.version,
            "Billing",
            billing.id.to_string(),
        )?;
        if let Some(invoice) = invoice {
            let stored_invoice = inner
                .invoices
                .get(&invoice.id)
                .ok_or_else(|| StoreError::not_found("Invoice", invoice.id))?;
            Inner::check_version(
                stored_invoice.version,
                invoice.version,
                "Invoice",
                invoice.id.to_string(),
            )?;
        }
        if inner.payments.contains_key(&payment.id) {
            return Err(StoreError::conflict(format!(
                "payment {} already exists",
                payment.id
            )));
        }

        // All checks passed; write the three records together
        inner.payments.insert(payment.id, payment.clone());
        let mut updated_billing = billing.clone();
        updated_billing.version = billing.version + 1;
        inner.billings.insert(billing.id, updated_billing);
        if let Some(invoice) = invoice {
            let mut updated_invoice = invoice.clone();
            updated_invoice.version = invoice.version + 1;
            inner.invoices.insert(invoice.id, updated_invoice);
        }
        Ok(())
    }

    async fn billable_residents(&self) -> Result<Vec<BillableResident>, StoreError> {
        let inner = self.inner.read().await;
        let mut billable = Vec::new();
        for resident in inner.residents.values() {
            if resident.status != ResidencyStatus::CheckedIn {
                continue;
            }
            let Some(room_id) = resident.room_id else {
                continue;
            };
            let room = inner
                .rooms
                .get(&room_id)
                .ok_or_else(|| StoreError::not_found("Room", room_id))?;
            billable.push(BillableResident {
                resident_id: resident.id,
                room_id,
                monthly_rate: room.price_per_month,
            });
        }
        Ok(billable)
    }
}

#[async_trait]
impl OccupancyStore for InMemoryStore {
    async fn insert_room(&self, room: &Room) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.rooms.contains_key(&room.id) {
            return Err(StoreError::conflict(format!("room {} already exists", room.id)));
        }
        if inner
            .rooms
            .values()
            .any(|r| r.room_number == room.room_number)
        {
            return Err(StoreError::conflict(format!(
                "room number {} already exists",
                room.room_number
            )));
        }
        inner.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn room(&self, id: RoomId) -> Result<Room, StoreError> {
        self.inner
            .read()
            .await
            .rooms
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Room", id))
    }

    async fn rooms(&self) -> Result<Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self.inner.read().await.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(rooms)
    }

    async fn update_room(&self, room: &Room, expected_version: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .rooms
            .get(&room.id)
            .ok_or_else(|| StoreError::not_found("Room", room.id))?;
        Inner::check_version(stored.version, expected_version, "Room", room.id.to_string())?;
        let mut updated = room.clone();
        updated.version = expected_version + 1;
        inner.rooms.insert(room.id, updated);
        Ok(())
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.rooms.remove(&id).is_none() {
            return Err(StoreError::not_found("Room", id));
        }
        Ok(())
    }

    async fn insert_resident(&self, resident: &Resident) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.residents.contains_key(&resident.id) {
            return Err(StoreError::conflict(format!(
                "resident {} already exists",
                resident.id
            )));
        }
        inner.residents.insert(resident.id, resident.clone());
        Ok(())
    }

    async fn resident(&self, id: ResidentId) -> Result<Resident, StoreError> {
        self.inner
            .read()
            .await
            .residents
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Resident", id))
    }

    async fn residents(&self) -> Result<Vec<Resident>, StoreError> {
        let mut residents: Vec<Resident> =
            self.inner.read().await.residents.values().cloned().collect();
        residents.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(residents)
    }

    async fn update_resident(
        &self,
        resident: &Resident,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .residents
            .get(&resident.id)
            .ok_or_else(|| StoreError::not_found("Resident", resident.id))?;
        Inner::check_version(
            stored.version,
            expected_version,
            "Resident",
            resident.id.to_string(),
        )?;
        let mut updated = resident.clone();
        updated.version = expected_version + 1;
        inner.residents.insert(resident.id, updated);
        Ok(())
    }

    async fn update_pair(&self, resident: &Resident, room: &Room) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        let stored_resident = inner
            .residents
            .get(&resident.id)
            .ok_or_else(|| StoreError::not_found("Resident", resident.id))?;
        Inner::check_version(
            stored_resident.version,
            resident.version,
            "Resident",
            resident.id.to_string(),
        )?;
        let stored_room = inner
            .rooms
            .get(&room.id)
            .ok_or_else(|| StoreError::not_found("Room", room.id))?;
        Inner::check_version(stored_room.version, room.version, "Room", room.id.to_string())?;

        let mut updated_resident = resident.clone();
        updated_resident.version = resident.version + 1;
        inner.residents.insert(resident.id, updated_resident);
        let mut updated_room = room.clone();
        updated_room.version = room.version + 1;
        inner.rooms.insert(room.id, updated_room);
        Ok(())
    }
}
