mod common;

use serde_json::json;

use bilingual_cms::cache::CacheEvent;
use bilingual_cms::error::Error;
use bilingual_cms::i18n::{Language, Message};
use bilingual_cms::media::MediaFile;
use bilingual_cms::models::{MessageStatus, NewContactMessage, Service};
use bilingual_cms::notify::ToastKind;

use common::test_cms;

#[tokio::test]
async fn create_adds_exactly_one_entry() {
    let t = test_cms().await;
    let services = t.cms.services();
    let before = services.list().await.unwrap();

    let created = services
        .create(&json!({ "name_ar": "خدمة", "name_en": "Service" }))
        .await
        .unwrap();
    assert_eq!(services.items().first(), Some(&created));

    let after = services.list().await.unwrap();
    assert_eq!(after.len(), before.len() + 1);
    let matching: Vec<&Service> = after.iter().filter(|s| s.id == created.id).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].name(Language::Ar), "خدمة");
    assert_eq!(t.notifier.last().unwrap().message, Message::Created);
}

#[tokio::test]
async fn update_changes_only_the_given_column() {
    let t = test_cms().await;
    let services = t.cms.services();
    let a = services
        .create(&json!({ "name_ar": "أ", "name_en": "A", "display_order": 1 }))
        .await
        .unwrap();
    let b = services
        .create(&json!({ "name_ar": "ب", "name_en": "B", "display_order": 2 }))
        .await
        .unwrap();

    let updated = services
        .update(&a.id, &json!({ "name_en": "Updated" }))
        .await
        .unwrap();
    assert_eq!(updated.name_en, "Updated");
    assert_eq!(updated.name_ar, "أ");
    assert_eq!(updated.display_order, 1);
    assert_eq!(updated.created_at, a.created_at);

    let rows = services.list().await.unwrap();
    let other = rows.iter().find(|s| s.id == b.id).unwrap();
    assert_eq!(other, &b);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let t = test_cms().await;
    let faqs = t.cms.faqs();
    let keep = faqs.create(&json!({ "question_en": "Keep?" })).await.unwrap();
    let drop = faqs.create(&json!({ "question_en": "Drop?" })).await.unwrap();
    faqs.list().await.unwrap();

    faqs.delete(&drop.id).await.unwrap();
    assert_eq!(faqs.items(), vec![keep.clone()]);
    faqs.delete(&drop.id).await.unwrap();

    let rows = faqs.list().await.unwrap();
    assert_eq!(rows, vec![keep]);
    assert!(t.notifier.errors().is_empty());
}

#[tokio::test]
async fn inbox_filter_returns_only_new_messages_newest_first() {
    let t = test_cms().await;
    let inbox = t.cms.messages();
    let mut ids = vec![];
    for name in ["a", "b", "c", "d"] {
        let message = inbox
            .submit(&NewContactMessage {
                name: name.into(),
                email: format!("{}@example.com", name),
                message: "hi".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(message.id);
    }
    inbox.set_status(&ids[1], MessageStatus::Read).await.unwrap();
    inbox.set_status(&ids[3], MessageStatus::Archived).await.unwrap();

    let fresh = inbox
        .list_filtered(Some(MessageStatus::New), None, None)
        .await
        .unwrap();
    let got: Vec<&str> = fresh.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(got, vec![ids[2].as_str(), ids[0].as_str()]);
    assert!(fresh.iter().all(|m| m.status == MessageStatus::New));
    assert_eq!(inbox.unread_count(), 2);
}

#[tokio::test]
async fn repeated_lists_are_equal() {
    let t = test_cms().await;
    let testimonials = t.cms.testimonials();
    for n in 0..3 {
        testimonials
            .create(&json!({ "client_name_en": format!("Client {}", n), "content_en": "Great", "rating": 5 }))
            .await
            .unwrap();
    }
    let first = testimonials.list().await.unwrap();
    let second = testimonials.list().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn stale_update_is_a_conflict() {
    let t = test_cms().await;
    let partners = t.cms.partners();
    let partner = partners
        .create(&json!({ "name_en": "Acme", "display_order": 1 }))
        .await
        .unwrap();
    let seen = partner.updated_at.unwrap();

    let first = partners
        .update_if_unmodified(&partner.id, seen, &json!({ "name_en": "Acme Ltd" }))
        .await
        .unwrap();
    assert_eq!(first.name_en, "Acme Ltd");

    let err = partners
        .update_if_unmodified(&partner.id, seen, &json!({ "name_en": "Acme Inc" }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(t.notifier.last().unwrap().message, Message::Conflict);

    let err = partners
        .update_if_unmodified("missing", seen, &json!({ "name_en": "x" }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let current = partners.get(&partner.id).await.unwrap();
    assert_eq!(current.name_en, "Acme Ltd");
    assert!(current.updated_at.unwrap() > seen);
}

#[tokio::test]
async fn repositories_share_one_cache() {
    let t = test_cms().await;
    let list_view = t.cms.industries();
    let edit_form = t.cms.industries();
    let mut events = t.cms.cache().subscribe();

    list_view.list().await.unwrap();
    let reads = t.store.select_count();

    let created = edit_form
        .create(&json!({ "name_ar": "صناعة", "name_en": "Industry" }))
        .await
        .unwrap();
    edit_form
        .update(&created.id, &json!({ "name_en": "Manufacturing" }))
        .await
        .unwrap();

    let seen = list_view.items();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].name_en, "Manufacturing");
    assert_eq!(t.store.select_count(), reads);

    edit_form.delete(&created.id).await.unwrap();
    assert!(list_view.items().is_empty());

    let mut kinds = vec![];
    while let Ok(event) = events.try_recv() {
        kinds.push(event);
    }
    assert!(kinds.contains(&CacheEvent::Removed {
        table: "industries".into(),
        id: created.id.clone(),
    }));
}

#[tokio::test]
async fn offline_write_leaves_state_and_reports_error() {
    let t = test_cms().await;
    let services = t.cms.services();
    services.create(&json!({ "name_en": "Kept" })).await.unwrap();
    services.list().await.unwrap();

    t.store.set_offline(true);
    assert!(services.create(&json!({ "name_en": "Lost" })).await.is_err());
    assert!(!services.is_saving());
    assert_eq!(services.items().len(), 1);

    let toast = t.notifier.last().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, Message::SaveFailed);
    assert_eq!(toast.text, Message::SaveFailed.text(Language::En));
}

#[tokio::test]
async fn toasts_follow_the_display_language() {
    let t = test_cms().await;
    t.cms.set_language(Language::Ar);
    t.cms.faqs().create(&json!({ "question_ar": "سؤال" })).await.unwrap();
    let toast = t.notifier.last().unwrap();
    assert_eq!(toast.language, Language::Ar);
    assert_eq!(toast.text, Message::Created.text(Language::Ar));
}

#[tokio::test]
async fn uploaded_media_is_publicly_addressable() {
    let t = test_cms().await;
    let settings = t.cms.settings();
    let url = settings
        .upload_media(&MediaFile::new("logo.PNG", vec![0x89, 0x50]).with_content_type("image/png"))
        .await
        .unwrap();
    assert!(url.starts_with("https://cdn.test/storage/v1/object/public/media/logo-"));
    assert!(url.ends_with(".png"));
    assert_eq!(t.media.len(), 1);

    settings.save(&json!({ "logo_url": url.clone() })).await.unwrap();
    assert_eq!(settings.branding().await.unwrap().logo_url, Some(url));
}
