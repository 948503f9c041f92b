//! End-to-end ledger flows over the in-memory store
//!
//! Drives the generator, issuer, recorder, and reconciliation engine the way
//! the API layer does, asserting the billing lifecycle invariants.

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{BillingId, InvoiceId, Money};
use domain_ledger::{
    BillingGenerator, BillingLocks, BillingStatus, InvoiceIssuer, InvoiceStatus, LedgerStore,
    NewPayment, NoopNotifier, PaymentMethod, PaymentRecorder, PaymentStatus, ReconciliationEngine,
};
use domain_occupancy::{OccupancyStore, RoomAllocator};
use infra_store::InMemoryStore;
use test_utils::{
    assert_conflict, assert_not_found, assert_validation, MoneyFixtures, NewPaymentBuilder,
    ResidentBuilder, RoomBuilder, TemporalFixtures,
};

struct Harness {
    store: Arc<InMemoryStore>,
    generator: BillingGenerator,
    issuer: InvoiceIssuer,
    recorder: PaymentRecorder,
    engine: ReconciliationEngine,
    allocator: RoomAllocator,
}

impl Harness {
    fn new() -> Self {
        let store = InMemoryStore::shared();
        let locks = Arc::new(BillingLocks::new());
        let ledger: Arc<dyn domain_ledger::LedgerStore> = store.clone();
        let occupancy: Arc<dyn domain_occupancy::OccupancyStore> = store.clone();

        Self {
            generator: BillingGenerator::new(ledger.clone()),
            issuer: InvoiceIssuer::new(ledger.clone()),
            recorder: PaymentRecorder::new(
                ledger.clone(),
                locks.clone(),
                Arc::new(NoopNotifier),
            ),
            engine: ReconciliationEngine::new(ledger, locks),
            allocator: RoomAllocator::new(occupancy),
            store,
        }
    }

    async fn checked_in_resident(&self, room_number: &str, rate: Money) -> core_kernel::ResidentId {
        let room = RoomBuilder::new()
            .with_number(room_number)
            .with_rate(rate)
            .build();
        let resident = ResidentBuilder::new()
            .with_name(format!("Resident {room_number}"))
            .build();
        self.store.insert_room(&room).await.unwrap();
        self.store.insert_resident(&resident).await.unwrap();
        self.allocator.allocate(resident.id, room.id).await.unwrap();
        resident.id
    }
}

fn cash(billing_id: BillingId, amount: Money) -> NewPayment {
    NewPaymentBuilder::new(billing_id, amount).build()
}

#[tokio::test]
async fn generation_bills_each_checked_in_resident_once() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::inr(dec!(5000))).await;
    h.checked_in_resident("102", MoneyFixtures::inr(dec!(6500))).await;

    let first = h.generator.generate(TemporalFixtures::billing_month()).await.unwrap();
    assert_eq!(first.generated.len(), 2);
    assert_eq!(first.skipped, 0);

    // A second run over the same period is a no-op
    let second = h.generator.generate(TemporalFixtures::billing_month()).await.unwrap();
    assert!(second.generated.is_empty());
    assert_eq!(second.skipped, 2);
}

#[tokio::test]
async fn unhoused_residents_are_not_billed() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let unhoused = ResidentBuilder::new().with_name("Walk-in Guest").build();
    h.store.insert_resident(&unhoused).await.unwrap();

    let report = h.generator.generate(TemporalFixtures::billing_month()).await.unwrap();
    assert_eq!(report.generated.len(), 1);
}

#[tokio::test]
async fn invoice_is_issued_once_per_billing() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let report = h.generator.generate(TemporalFixtures::billing_month()).await.unwrap();
    let billing_id = report.generated[0];

    let invoice = h.issuer.issue(billing_id).await.unwrap();
    assert_eq!(invoice.total_amount, MoneyFixtures::monthly_rate());
    assert_eq!(invoice.status, InvoiceStatus::Pending);

    assert_conflict(h.issuer.issue(billing_id).await);
}

#[tokio::test]
async fn full_payment_settles_billing_and_invoice() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];
    h.issuer.issue(billing_id).await.unwrap();

    let outcome = h
        .recorder
        .record(
            NewPaymentBuilder::new(billing_id, MoneyFixtures::monthly_rate())
                .with_method(PaymentMethod::Upi)
                .with_reference("TXN-1")
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.billing.status, BillingStatus::Paid);
    assert!(outcome.billing.paid_at.is_some());
    let invoice = outcome.invoice.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert!(invoice.paid_at.is_some());

    // The persisted state matches the returned outcome
    let stored = h.store.billing(billing_id).await.unwrap();
    assert_eq!(stored.status, BillingStatus::Paid);
}

#[tokio::test]
async fn partial_payments_settle_in_steps() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];

    let partial = h
        .recorder
        .record(cash(billing_id, MoneyFixtures::inr(dec!(2000))))
        .await
        .unwrap();
    assert_eq!(partial.billing.status, BillingStatus::Pending);

    let remainder = h
        .recorder
        .record(cash(billing_id, MoneyFixtures::inr(dec!(3000))))
        .await
        .unwrap();
    assert_eq!(remainder.billing.status, BillingStatus::Paid);
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];

    h.recorder
        .record(cash(billing_id, MoneyFixtures::inr(dec!(4000))))
        .await
        .unwrap();

    assert_conflict(
        h.recorder
            .record(cash(billing_id, MoneyFixtures::inr(dec!(1500))))
            .await,
    );

    // Nothing was written for the rejected payment
    let payments = h.store.payments_for_billing(billing_id).await.unwrap();
    assert_eq!(payments.len(), 1);
}

#[tokio::test]
async fn payment_quoting_its_own_invoice_settles_it() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];
    let invoice = h.issuer.issue(billing_id).await.unwrap();

    let outcome = h
        .recorder
        .record(
            NewPaymentBuilder::new(billing_id, MoneyFixtures::monthly_rate())
                .with_invoice(invoice.id)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.billing.status, BillingStatus::Paid);
    assert_eq!(outcome.invoice.unwrap().status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn payment_quoting_unknown_invoice_is_not_found() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];

    assert_not_found(
        h.recorder
            .record(
                NewPaymentBuilder::new(billing_id, MoneyFixtures::monthly_rate())
                    .with_invoice(InvoiceId::new())
                    .build(),
            )
            .await,
    );
}

#[tokio::test]
async fn payment_quoting_another_billings_invoice_is_rejected() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::inr(dec!(5000))).await;
    h.checked_in_resident("102", MoneyFixtures::inr(dec!(6000))).await;
    let report = h.generator.generate(TemporalFixtures::billing_month()).await.unwrap();
    let (first, second) = (report.generated[0], report.generated[1]);
    let invoice = h.issuer.issue(first).await.unwrap();

    assert_validation(
        h.recorder
            .record(
                NewPaymentBuilder::new(second, MoneyFixtures::inr(dec!(1000)))
                    .with_invoice(invoice.id)
                    .build(),
            )
            .await,
    );

    // Nothing was written for the rejected payment
    let payments = h.store.payments_for_billing(second).await.unwrap();
    assert!(payments.is_empty());
}

#[tokio::test]
async fn pending_payments_do_not_settle() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];

    let outcome = h
        .recorder
        .record(
            NewPaymentBuilder::new(billing_id, MoneyFixtures::monthly_rate())
                .with_method(PaymentMethod::Online)
                .with_status(PaymentStatus::Pending)
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.billing.status, BillingStatus::Pending);
}

#[tokio::test]
async fn refund_demotes_paid_billing_and_invoice() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];
    h.issuer.issue(billing_id).await.unwrap();

    let paid = h
        .recorder
        .record(cash(billing_id, MoneyFixtures::monthly_rate()))
        .await
        .unwrap();
    assert_eq!(paid.billing.status, BillingStatus::Paid);

    let refunded = h.recorder.refund(paid.payment.id).await.unwrap();
    assert_eq!(refunded.billing.status, BillingStatus::Pending);
    assert!(refunded.billing.paid_at.is_none());
    assert_eq!(refunded.invoice.unwrap().status, InvoiceStatus::Pending);

    // Refunding twice conflicts
    assert_conflict(h.recorder.refund(paid.payment.id).await);
}

#[tokio::test]
async fn payment_against_cancelled_billing_is_rejected() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];

    h.engine.cancel_billing(billing_id).await.unwrap();

    assert_conflict(
        h.recorder
            .record(cash(billing_id, MoneyFixtures::monthly_rate()))
            .await,
    );
}

#[tokio::test]
async fn cancel_refused_with_completed_payment() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];

    h.recorder
        .record(cash(billing_id, MoneyFixtures::inr(dec!(1000))))
        .await
        .unwrap();

    assert_conflict(h.engine.cancel_billing(billing_id).await);
}

#[tokio::test]
async fn cancelling_billing_cancels_its_invoice() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];
    let invoice = h.issuer.issue(billing_id).await.unwrap();

    let cancelled = h.engine.cancel_billing(billing_id).await.unwrap();
    assert_eq!(cancelled.status, BillingStatus::Cancelled);

    let stored = h.store.invoice(invoice.id).await.unwrap();
    assert_eq!(stored.status, InvoiceStatus::Cancelled);
}

#[tokio::test]
async fn sweep_marks_unpaid_elapsed_billings_overdue() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::inr(dec!(5000))).await;
    h.checked_in_resident("102", MoneyFixtures::inr(dec!(6000))).await;
    let report = h.generator.generate(TemporalFixtures::billing_month()).await.unwrap();
    let paid_id = report.generated[0];

    h.recorder
        .record(cash(paid_id, MoneyFixtures::inr(dec!(1))))
        .await
        .unwrap();

    let after_period = TemporalFixtures::after_billing_month();
    let sweep = h.engine.sweep_overdue(after_period).await.unwrap();

    // Only the billing with no completed payment is marked
    assert_eq!(sweep.billings_marked, 1);
    let overdue = h
        .store
        .billings_with_status(BillingStatus::Overdue)
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_ne!(overdue[0].id, paid_id);

    // Sweeping again changes nothing
    let again = h.engine.sweep_overdue(after_period).await.unwrap();
    assert_eq!(again.billings_marked, 0);
}

#[tokio::test]
async fn overdue_billing_returns_to_pending_on_partial_payment() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];

    h.engine
        .sweep_overdue(TemporalFixtures::after_billing_month())
        .await
        .unwrap();
    assert_eq!(
        h.store.billing(billing_id).await.unwrap().status,
        BillingStatus::Overdue
    );

    let outcome = h
        .recorder
        .record(cash(billing_id, MoneyFixtures::inr(dec!(100))))
        .await
        .unwrap();
    assert_eq!(outcome.billing.status, BillingStatus::Pending);
}

#[tokio::test]
async fn concurrent_payments_never_oversettle() {
    let h = Harness::new();
    h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    let billing_id = h
        .generator
        .generate(TemporalFixtures::billing_month())
        .await
        .unwrap()
        .generated[0];

    let recorder = Arc::new(h.recorder);
    let mut handles = Vec::new();
    for _ in 0..10 {
        let recorder = Arc::clone(&recorder);
        handles.push(tokio::spawn(async move {
            recorder
                .record(cash(billing_id, MoneyFixtures::inr(dec!(1000))))
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    // Exactly five 1000 payments fit into the 5000 total
    assert_eq!(accepted, 5);
    let billing = h.store.billing(billing_id).await.unwrap();
    assert_eq!(billing.status, BillingStatus::Paid);
    let payments = h.store.payments_for_billing(billing_id).await.unwrap();
    assert_eq!(payments.len(), 5);
}

#[tokio::test]
async fn resident_summary_totals_history() {
    let h = Harness::new();
    let resident_id = h.checked_in_resident("101", MoneyFixtures::monthly_rate()).await;
    h.generator.generate(TemporalFixtures::billing_month()).await.unwrap();
    h.generator
        .generate(TemporalFixtures::month(2026, 9))
        .await
        .unwrap();

    let summary = h.generator.resident_summary(resident_id).await.unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.total, MoneyFixtures::inr(dec!(10000)));
}
