//! Test Data Builders
//!
//! Builders for constructing test entities with sensible defaults. Tests
//! specify only the fields they assert on; everything else comes from the
//! fixtures. Builders panic on invalid input since they only run in tests.

use core_kernel::{BillingId, BillingPeriod, InvoiceId, Money, ResidentId};
use domain_ledger::{Billing, ChargeBreakdown, NewPayment, PaymentMethod, PaymentStatus};
use domain_occupancy::{Resident, Room, RoomType};

use crate::fixtures::{MoneyFixtures, TemporalFixtures};

/// Builder for a [`Billing`] with an itemized charge breakdown
pub struct BillingBuilder {
    resident_id: ResidentId,
    period: BillingPeriod,
    charges: ChargeBreakdown,
}

impl Default for BillingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingBuilder {
    pub fn new() -> Self {
        Self {
            resident_id: ResidentId::new(),
            period: TemporalFixtures::billing_month(),
            charges: ChargeBreakdown::room_only(MoneyFixtures::monthly_rate()),
        }
    }

    pub fn with_resident(mut self, resident_id: ResidentId) -> Self {
        self.resident_id = resident_id;
        self
    }

    pub fn with_period(mut self, period: BillingPeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_room_fee(mut self, room_fee: Money) -> Self {
        self.charges.room_fee = room_fee;
        self
    }

    pub fn with_charges(mut self, charges: ChargeBreakdown) -> Self {
        self.charges = charges;
        self
    }

    pub fn build(self) -> Billing {
        Billing::new(self.resident_id, self.period, self.charges)
            .expect("invalid billing fixture")
    }
}

/// Builder for the [`NewPayment`] draft handed to the payment recorder
pub struct NewPaymentBuilder {
    draft: NewPayment,
}

impl NewPaymentBuilder {
    pub fn new(billing_id: BillingId, amount: Money) -> Self {
        Self {
            draft: NewPayment {
                billing_id,
                invoice_id: None,
                amount,
                method: PaymentMethod::Cash,
                status: None,
                reference: None,
                recorded_by: None,
                notes: None,
            },
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.draft.method = method;
        self
    }

    pub fn with_invoice(mut self, invoice_id: InvoiceId) -> Self {
        self.draft.invoice_id = Some(invoice_id);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.draft.status = Some(status);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.draft.reference = Some(reference.into());
        self
    }

    pub fn build(self) -> NewPayment {
        self.draft
    }
}

/// Builder for a [`Room`]
pub struct RoomBuilder {
    room_number: String,
    room_type: RoomType,
    capacity: Option<u32>,
    price_per_month: Money,
}

impl Default for RoomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomBuilder {
    pub fn new() -> Self {
        Self {
            room_number: "101".to_string(),
            room_type: RoomType::Single,
            capacity: None,
            price_per_month: MoneyFixtures::monthly_rate(),
        }
    }

    pub fn with_number(mut self, room_number: impl Into<String>) -> Self {
        self.room_number = room_number.into();
        self
    }

    pub fn with_type(mut self, room_type: RoomType) -> Self {
        self.room_type = room_type;
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_rate(mut self, price_per_month: Money) -> Self {
        self.price_per_month = price_per_month;
        self
    }

    pub fn build(self) -> Room {
        let capacity = self
            .capacity
            .unwrap_or_else(|| self.room_type.default_capacity());
        Room::new(self.room_number, self.room_type, capacity, self.price_per_month)
            .expect("invalid room fixture")
    }
}

/// Builder for a [`Resident`]
pub struct ResidentBuilder {
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
}

impl Default for ResidentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResidentBuilder {
    pub fn new() -> Self {
        Self {
            full_name: "Test Resident".to_string(),
            email: None,
            phone: None,
        }
    }

    pub fn with_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn build(self) -> Resident {
        let mut resident = Resident::new(self.full_name).expect("invalid resident fixture");
        resident.email = self.email;
        resident.phone = self.phone;
        resident
    }
}
