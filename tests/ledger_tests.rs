use std::collections::BTreeMap;

use avatarforge::config::AccessConfig;
use avatarforge::db::{NewAvatar, Store};
use avatarforge::entities::avatars;
use avatarforge::models::avatar::{AvatarDocument, SectionContent};
use avatarforge::services::{
    CreditError, CreditService, ProvisioningService, is_authorized,
};
use sea_orm::{ActiveModelTrait, Set};

fn access_config() -> AccessConfig {
    AccessConfig {
        admin_emails: vec!["admin@x.com".to_string()],
        super_admin_email: "root@x.com".to_string(),
        ..AccessConfig::default()
    }
}

async fn setup() -> (Store, CreditService, ProvisioningService) {
    let store = Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory store");
    let credits = CreditService::new(store.clone());
    let provisioning = ProvisioningService::new(store.clone(), access_config());
    (store, credits, provisioning)
}

#[tokio::test]
async fn provisions_regular_account_unapproved() {
    let (_, _, provisioning) = setup().await;

    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    assert_eq!(account.credits, 5);
    assert!(!account.is_active);
    assert!(!account.is_authenticated);
    assert!(!account.is_admin);
    assert!(!is_authorized(&account));
}

#[tokio::test]
async fn provisions_admin_account_approved() {
    let (_, _, provisioning) = setup().await;

    let account = provisioning
        .ensure_account("a1", "admin@x.com")
        .await
        .unwrap();

    assert!(account.is_active);
    assert!(account.is_authenticated);
    assert!(account.is_admin);
    assert!(is_authorized(&account));
}

#[tokio::test]
async fn ensure_account_is_idempotent() {
    let (store, _, provisioning) = setup().await;

    let first = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();
    let second = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.credits, 5);
    assert_eq!(store.list_accounts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn ensure_account_refreshes_stale_email() {
    let (_, _, provisioning) = setup().await;

    let first = provisioning
        .ensure_account("u1", "old@x.com")
        .await
        .unwrap();
    let second = provisioning
        .ensure_account("u1", "new@x.com")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.email, "new@x.com");
    assert_eq!(second.credits, 5);
}

#[tokio::test]
async fn debit_decrements_and_logs_exactly_once() {
    let (_, credits, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    let updated = credits
        .debit(account.id, 2, "Credits used for avatar generation")
        .await
        .unwrap();
    assert_eq!(updated.credits, 3);

    let history = credits.history(account.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, -2);
    assert_eq!(history[0].action_type, "deduct");
    assert_eq!(history[0].external_id, "u1");
}

#[tokio::test]
async fn debit_refuses_without_side_effects() {
    let (_, credits, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    let result = credits.debit(account.id, 99, "too much").await;
    assert!(matches!(result, Err(CreditError::InsufficientCredits)));

    assert_eq!(credits.balance(account.id).await.unwrap(), 5);
    assert!(credits.history(account.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn debit_unknown_account_is_not_found() {
    let (_, credits, _) = setup().await;

    let result = credits.debit(4242, 1, "ghost").await;
    assert!(matches!(result, Err(CreditError::AccountNotFound)));
}

#[tokio::test]
async fn admin_adjustment_may_force_negative_balance() {
    let (_, credits, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    credits.debit(account.id, 2, "spend").await.unwrap();

    let updated = credits.adjust(account.id, 10, false).await.unwrap();
    assert_eq!(updated.credits, -7);

    let history = credits.history(account.id).await.unwrap();
    assert_eq!(history[0].amount, -10);
    assert_eq!(history[0].action_type, "admin_remove");
    assert_eq!(history[0].description, "Admin removed 10 credits");
}

#[tokio::test]
async fn admin_addition_works_from_any_balance() {
    let (_, credits, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    credits.adjust(account.id, 10, false).await.unwrap();
    let updated = credits.adjust(account.id, 3, true).await.unwrap();
    assert_eq!(updated.credits, -2);

    let history = credits.history(account.id).await.unwrap();
    assert_eq!(history[0].amount, 3);
    assert_eq!(history[0].action_type, "admin_add");
}

#[tokio::test]
async fn refund_restores_balance_with_its_own_tag() {
    let (_, credits, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    credits.debit(account.id, 1, "spend").await.unwrap();
    let updated = credits
        .refund(account.id, 1, "Refund for failed avatar generation")
        .await
        .unwrap();
    assert_eq!(updated.credits, 5);

    let history = credits.history(account.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].amount, 1);
    assert_eq!(history[0].action_type, "refund");
    assert_eq!(history[1].action_type, "deduct");
}

#[tokio::test]
async fn ledger_reconciles_with_balance() {
    let (_, credits, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    credits.debit(account.id, 2, "spend").await.unwrap();
    credits.adjust(account.id, 7, true).await.unwrap();
    credits.adjust(account.id, 4, false).await.unwrap();
    credits.refund(account.id, 1, "refund").await.unwrap();

    let balance = credits.balance(account.id).await.unwrap();
    let ledger_sum: i64 = credits
        .history(account.id)
        .await
        .unwrap()
        .iter()
        .map(|entry| entry.amount)
        .sum();

    assert_eq!(balance, 5 + ledger_sum);
}

fn sample_document() -> AvatarDocument {
    let mut details = BTreeMap::new();
    details.insert("name".to_string(), "Anna".to_string());
    details.insert("career".to_string(), "Teacher".to_string());

    let mut document = AvatarDocument {
        details,
        ..AvatarDocument::default()
    };
    document.story = SectionContent {
        headline: "Their Background".to_string(),
        points: vec!["Grew up in Chiang Mai".to_string()],
    };
    document.pain_points = SectionContent {
        headline: "Current Struggles".to_string(),
        points: vec!["No time to study".to_string(), "Feels left behind".to_string()],
    };
    document
}

#[tokio::test]
async fn avatar_round_trips_through_the_store() {
    let (store, _, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    let document = sample_document();
    let saved = store
        .insert_avatar(
            &account,
            NewAvatar {
                name: document.display_name(),
                document: document.clone(),
                target_audience: "Thai moms".to_string(),
                help_description: "learning English".to_string(),
                image_url: Some("https://cdn.example/a.png".to_string()),
                image_keyword: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(saved.name, "Anna - Teacher");

    let listed = store.list_avatars(account.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].document, document);
    assert_eq!(listed[0].target_audience, "Thai moms");
    assert_eq!(
        listed[0].image_url.as_deref(),
        Some("https://cdn.example/a.png")
    );
}

#[tokio::test]
async fn legacy_rows_load_as_canonical_sections() {
    let (store, _, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    let now = chrono::Utc::now().to_rfc3339();
    let empty = "{}".to_string();
    let legacy = avatars::ActiveModel {
        account_id: Set(account.id),
        external_id: Set(account.external_id.clone()),
        account_email: Set(account.email.clone()),
        name: Set("Legacy Avatar".to_string()),
        // v0: bare Key: value text
        details: Set("Name: Mark\nCareer: Plumber".to_string()),
        // v1: main/subPoints items
        story: Set(r#"[{"main": "Started a trade", "subPoints": ["Left school early"]}]"#
            .to_string()),
        // v1: typed problem items
        biggest_problem: Set(
            r#"[{"type": "financial", "problem": "Irregular income"}]"#.to_string(),
        ),
        // nested data wrapper
        current_wants: Set(r#"{"data": {"headline": "Immediate Needs", "points": ["Steady work"]}}"#
            .to_string()),
        pain_points: Set(empty.clone()),
        desires: Set(empty.clone()),
        offer_results: Set(empty.clone()),
        humiliation: Set(empty.clone()),
        frustrations: Set(empty.clone()),
        complaints: Set(empty.clone()),
        cost_of_not_buying: Set(empty.clone()),
        biggest_want: Set(empty),
        target_audience: Set("tradespeople".to_string()),
        help_description: Set("finding clients".to_string()),
        image_url: Set(None),
        image_keyword: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let row = legacy.insert(&store.conn).await.unwrap();

    let avatar = store.get_avatar(row.id).await.unwrap().unwrap();
    let document = &avatar.document;

    assert_eq!(document.details.get("name").map(String::as_str), Some("Mark"));
    assert_eq!(
        document.story.points,
        vec!["Started a trade", "Left school early"]
    );
    assert_eq!(document.biggest_problem.points, vec!["Irregular income"]);
    assert_eq!(document.current_wants.headline, "Immediate Needs");
    assert_eq!(document.current_wants.points, vec!["Steady work"]);
    assert!(document.pain_points.is_empty());
}

#[tokio::test]
async fn cascade_delete_removes_avatars_and_ledger() {
    let (store, credits, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    credits.debit(account.id, 1, "spend").await.unwrap();
    store
        .insert_avatar(
            &account,
            NewAvatar {
                name: "Doomed".to_string(),
                document: sample_document(),
                target_audience: "t".to_string(),
                help_description: "h".to_string(),
                image_url: None,
                image_keyword: None,
            },
        )
        .await
        .unwrap();

    assert!(store.delete_account_cascade(account.id).await.unwrap());

    assert!(store.get_account(account.id).await.unwrap().is_none());
    assert!(store.list_avatars(account.id).await.unwrap().is_empty());
    assert!(store.credit_history(account.id).await.unwrap().is_empty());

    // Deleting again reports not-found rather than erroring
    assert!(!store.delete_account_cascade(account.id).await.unwrap());
}

#[tokio::test]
async fn avatar_delete_keeps_ledger_history() {
    let (store, credits, provisioning) = setup().await;
    let account = provisioning
        .ensure_account("u1", "user@x.com")
        .await
        .unwrap();

    credits.debit(account.id, 1, "spend").await.unwrap();
    let avatar = store
        .insert_avatar(
            &account,
            NewAvatar {
                name: "Short-lived".to_string(),
                document: sample_document(),
                target_audience: "t".to_string(),
                help_description: "h".to_string(),
                image_url: None,
                image_keyword: None,
            },
        )
        .await
        .unwrap();

    assert!(store.delete_avatar(avatar.id).await.unwrap());

    // The credit spent on it stays spent, and the audit trail stays intact
    assert_eq!(credits.balance(account.id).await.unwrap(), 4);
    assert_eq!(credits.history(account.id).await.unwrap().len(), 1);
}
