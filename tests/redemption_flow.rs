//! Integration tests for the checkout-to-completion redemption flow.
//!
//! Exercises balance queries, discount holds, exactly-once order commits,
//! and FIFO deduction end to end against the in-memory store.

use chrono::{Duration, NaiveDate, Utc};
use gift_card_ledger::activity::{ActionType, ActivityLogger};
use gift_card_ledger::config::Settings;
use gift_card_ledger::db::memory::{
    MemoryActivityRepository, MemoryGiftCardRepository, MemoryOrderDiscountRepository,
};
use gift_card_ledger::db::GiftCardRepository;
use gift_card_ledger::ledger::{GiftCardType, NewGiftCard};
use gift_card_ledger::redemption::{CommitOutcome, RedemptionEngine};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

struct Stack {
    engine: RedemptionEngine,
    cards: MemoryGiftCardRepository,
    activity: MemoryActivityRepository,
}

fn stack() -> Stack {
    let cards = MemoryGiftCardRepository::new();
    let activity = MemoryActivityRepository::new();
    let engine = RedemptionEngine::new(
        Arc::new(cards.clone()),
        Arc::new(MemoryOrderDiscountRepository::new()),
        ActivityLogger::new(Arc::new(activity.clone()), &Settings::default()),
    );
    Stack {
        engine,
        cards,
        activity,
    }
}

async fn seed(
    cards: &MemoryGiftCardRepository,
    code: &str,
    balance: Decimal,
    owner: i64,
    issued_days_ago: i64,
    expiration: Option<NaiveDate>,
) {
    let draft = NewGiftCard {
        balance,
        expiration_date: expiration,
        sender_name: "Sender".to_string(),
        sender_email: "sender@example.com".to_string(),
        recipient_email: "recipient@example.com".to_string(),
        message: String::new(),
        delivery_date: None,
        gift_card_type: GiftCardType::Digital,
    };
    cards
        .insert_full(
            code,
            &draft,
            Utc::now() - Duration::days(issued_days_ago),
            Some(owner),
        )
        .await
        .expect("seed insert should succeed");
}

#[tokio::test]
async fn checkout_flow_caps_discount_at_cart_subtotal() {
    // Card of 100.00, no expiry; cart of 60.00 with the full balance
    // requested. The discount is 60.00, the card ends at 40.00, and one
    // `used` entry of 60.00 lands on the trail.
    let s = stack();
    seed(&s.cards, "FLOWAAA111", dec!(100.00), 1, 0, None).await;

    let eligible = s
        .engine
        .query_eligible_balance(1)
        .await
        .expect("balance query should succeed");
    let discount = RedemptionEngine::compute_discount(dec!(100.00), eligible, dec!(60.00));
    assert_eq!(discount, dec!(60.00));

    s.engine
        .hold_discount("session-1", discount)
        .expect("hold should succeed");
    assert_eq!(s.engine.held_discount("session-1"), Some(dec!(60.00)));

    let outcome = s
        .engine
        .commit_order(9001, 1, discount)
        .await
        .expect("commit should succeed");
    let CommitOutcome::Committed(deduction) = outcome else {
        panic!("first commit should apply deductions");
    };
    assert_eq!(deduction.deducted, dec!(60.00));
    assert_eq!(deduction.shortfall, Decimal::ZERO);

    let card = s
        .cards
        .get_by_code("FLOWAAA111")
        .await
        .expect("lookup should succeed")
        .expect("card should exist");
    assert_eq!(card.balance, dec!(40.00));

    let entries = s.activity.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action_type, ActionType::Used);
    assert_eq!(entries[0].amount, Some(dec!(60.00)));
    assert_eq!(entries[0].user_id, Some(1));
}

#[tokio::test]
async fn two_card_fifo_scenario() {
    // Day-1 card of 30.00 and day-2 card of 50.00; a 45.00 discount takes
    // the older card to zero and 15.00 from the newer one.
    let s = stack();
    seed(&s.cards, "FIFOAAA111", dec!(30.00), 2, 2, None).await;
    seed(&s.cards, "FIFOBBB222", dec!(50.00), 2, 1, None).await;

    let outcome = s
        .engine
        .commit_order(9002, 2, dec!(45.00))
        .await
        .expect("commit should succeed");
    let CommitOutcome::Committed(deduction) = outcome else {
        panic!("first commit should apply deductions");
    };

    assert_eq!(deduction.deductions.len(), 2);
    assert_eq!(deduction.deductions[0].code, "FIFOAAA111");
    assert_eq!(deduction.deductions[0].amount, dec!(30.00));
    assert_eq!(deduction.deductions[1].code, "FIFOBBB222");
    assert_eq!(deduction.deductions[1].amount, dec!(15.00));

    let older = s.cards.get_by_code("FIFOAAA111").await.unwrap().unwrap();
    let newer = s.cards.get_by_code("FIFOBBB222").await.unwrap().unwrap();
    assert_eq!(older.balance, dec!(0.00));
    assert_eq!(newer.balance, dec!(35.00));

    assert_eq!(s.activity.entries().len(), 2);
}

#[tokio::test]
async fn three_card_fifo_stops_once_discount_is_exhausted() {
    let s = stack();
    seed(&s.cards, "FIFOT1AAAA", dec!(20.00), 3, 3, None).await;
    seed(&s.cards, "FIFOT2BBBB", dec!(20.00), 3, 2, None).await;
    seed(&s.cards, "FIFOT3CCCC", dec!(20.00), 3, 1, None).await;

    let outcome = s
        .engine
        .apply_fifo_deduction(3, dec!(30.00))
        .await
        .expect("deduction should succeed");

    assert_eq!(outcome.deducted, dec!(30.00));
    let codes: Vec<&str> = outcome.deductions.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["FIFOT1AAAA", "FIFOT2BBBB"]);

    let t3 = s.cards.get_by_code("FIFOT3CCCC").await.unwrap().unwrap();
    assert_eq!(t3.balance, dec!(20.00), "third card untouched");
}

#[tokio::test]
async fn balances_never_go_negative_across_repeated_deductions() {
    let s = stack();
    seed(&s.cards, "DRAINAAA11", dec!(37.45), 4, 0, None).await;

    for amount in [dec!(10.00), dec!(9.99), dec!(20.00), dec!(5.00), dec!(0.01)] {
        s.engine
            .apply_fifo_deduction(4, amount)
            .await
            .expect("deduction should succeed");
        let card = s.cards.get_by_code("DRAINAAA11").await.unwrap().unwrap();
        assert!(
            card.balance >= Decimal::ZERO,
            "balance went negative: {}",
            card.balance
        );
    }

    let card = s.cards.get_by_code("DRAINAAA11").await.unwrap().unwrap();
    assert_eq!(card.balance, Decimal::ZERO);
}

#[tokio::test]
async fn duplicate_completion_event_does_not_deduct_twice() {
    let s = stack();
    seed(&s.cards, "DUPEAAA111", dec!(80.00), 5, 0, None).await;

    let first = s.engine.commit_order(9005, 5, dec!(25.00)).await.unwrap();
    assert!(matches!(first, CommitOutcome::Committed(_)));

    // The platform fired order-completed twice.
    let second = s.engine.commit_order(9005, 5, dec!(25.00)).await.unwrap();
    assert!(matches!(second, CommitOutcome::AlreadyCommitted));

    let card = s.cards.get_by_code("DUPEAAA111").await.unwrap().unwrap();
    assert_eq!(card.balance, dec!(55.00));
    assert_eq!(s.activity.entries().len(), 1, "one `used` entry, not two");
}

#[tokio::test]
async fn expired_card_still_redeemable() {
    // Expiry only drives reminder emails. A card past its expiration date
    // keeps counting toward the eligible balance and keeps its place in the
    // FIFO order.
    let s = stack();
    let long_expired = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
    seed(&s.cards, "EXPDAAA111", dec!(40.00), 6, 10, Some(long_expired)).await;
    seed(&s.cards, "FRESHBB222", dec!(40.00), 6, 1, None).await;

    let eligible = s.engine.query_eligible_balance(6).await.unwrap();
    assert_eq!(eligible, dec!(80.00), "expired balance still counts");

    let outcome = s.engine.apply_fifo_deduction(6, dec!(50.00)).await.unwrap();
    assert_eq!(outcome.deductions[0].code, "EXPDAAA111");
    assert_eq!(outcome.deductions[0].amount, dec!(40.00));
    assert_eq!(outcome.deductions[1].amount, dec!(10.00));
}

#[tokio::test]
async fn shortfall_between_query_and_commit_is_absorbed() {
    let s = stack();
    seed(&s.cards, "RACEAAA111", dec!(50.00), 7, 0, None).await;

    // Session saw 50.00 and the checkout granted 50.00...
    let eligible = s.engine.query_eligible_balance(7).await.unwrap();
    let discount = RedemptionEngine::compute_discount(dec!(50.00), eligible, dec!(100.00));
    assert_eq!(discount, dec!(50.00));

    // ...but another order drained most of the card first.
    s.engine.apply_fifo_deduction(7, dec!(45.00)).await.unwrap();

    let outcome = s.engine.commit_order(9007, 7, discount).await.unwrap();
    let CommitOutcome::Committed(deduction) = outcome else {
        panic!("commit should still apply");
    };
    assert_eq!(deduction.deducted, dec!(5.00));
    assert_eq!(deduction.shortfall, dec!(45.00));

    let card = s.cards.get_by_code("RACEAAA111").await.unwrap().unwrap();
    assert_eq!(card.balance, Decimal::ZERO, "clamped, never negative");
}

#[tokio::test]
async fn abandoned_session_leaves_no_trace() {
    let s = stack();
    seed(&s.cards, "ABANAAA111", dec!(30.00), 8, 0, None).await;

    s.engine.hold_discount("session-gone", dec!(30.00)).unwrap();
    s.engine.release_discount("session-gone");

    let card = s.cards.get_by_code("ABANAAA111").await.unwrap().unwrap();
    assert_eq!(card.balance, dec!(30.00));
    assert!(s.activity.entries().is_empty());
}

#[tokio::test]
async fn deductions_for_an_order_never_exceed_its_discount() {
    let s = stack();
    seed(&s.cards, "SUMAAA1111", dec!(12.34), 9, 3, None).await;
    seed(&s.cards, "SUMBBB2222", dec!(56.78), 9, 2, None).await;
    seed(&s.cards, "SUMCCC3333", dec!(9.01), 9, 1, None).await;

    let discount = dec!(60.00);
    let outcome = s.engine.commit_order(9009, 9, discount).await.unwrap();
    let CommitOutcome::Committed(deduction) = outcome else {
        panic!("first commit should apply deductions");
    };

    let total: Decimal = deduction.deductions.iter().map(|d| d.amount).sum();
    assert_eq!(total, deduction.deducted);
    assert!(total <= discount);
    assert_eq!(total, discount);
}
