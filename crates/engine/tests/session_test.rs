//! Tests for the train/recommend session workflow.

use std::sync::Arc;

use data_loader::{Dataset, Item, Transaction};
use engine::RecommendationSession;
use model::{DuplicatePolicy, ModelError, SvdConfig};
use pipeline::{RecommendError, Recommender};

fn dataset() -> Arc<Dataset> {
    let mut transactions = Vec::new();
    for user in 1..=6u32 {
        for attraction in 1..=5u32 {
            if (user + attraction) % 3 != 0 {
                let rating = ((user * attraction) % 5 + 1) as f64;
                transactions.push(Transaction::new(user, attraction * 10, rating));
            }
        }
    }
    let items = vec![
        Item::new(10, "Kuta Beach"),
        Item::new(20, "Tanah Lot"),
        Item::new(30, "Borobudur"),
        Item::new(40, "Merapi Volcano"),
    ];
    Arc::new(Dataset::from_parts(transactions, items).unwrap())
}

fn session() -> RecommendationSession {
    RecommendationSession::new(dataset(), DuplicatePolicy::Mean).unwrap()
}

#[test]
fn test_recommend_requires_training() {
    let session = session();
    assert!(!session.is_trained().unwrap());

    let err = session.recommend(1, 5).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RecommendError>(),
        Some(RecommendError::ModelNotTrained)
    ));
}

#[test]
fn test_train_then_recommend() {
    let session = session();
    session.train(&SvdConfig::new(2)).unwrap();
    assert!(session.is_trained().unwrap());

    let recs = session.recommend(1, 5).unwrap().unwrap();
    assert!(!recs.is_empty());
    for rec in &recs {
        assert!(session.matrix().get(1, rec.attraction_id).unwrap() <= 0.0);
        if rec.attraction_id == 50 {
            assert_eq!(rec.name, None);
        } else {
            assert!(rec.name.is_some());
        }
    }

    assert!(session.recommend(42, 5).unwrap().is_none());
}

#[test]
fn test_training_is_cached_per_config() {
    let session = session();

    let first = session.train(&SvdConfig::new(2)).unwrap();
    let again = session.train(&SvdConfig::new(2)).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    let other = session.train(&SvdConfig::new(3)).unwrap();
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(other.config().rank, 3);
}

#[test]
fn test_failed_training_keeps_previous_model() {
    let session = session();
    let good = session.train(&SvdConfig::new(2)).unwrap();

    // 6 users x 5 attractions: rank 5 is out of range
    let err = session.train(&SvdConfig::new(5)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::InvalidRank { rank: 5, .. })
    ));

    let current = session.trained_model().unwrap().unwrap();
    assert!(Arc::ptr_eq(&good, &current));
    assert!(session.recommend(1, 5).unwrap().is_some());
}

#[test]
fn test_custom_recommender() {
    let session = session().with_recommender(Recommender::new().with_min_score(f64::INFINITY));
    session.train(&SvdConfig::new(2)).unwrap();

    let recs = session.recommend(1, 5).unwrap().unwrap();
    assert!(recs.is_empty());
}

#[test]
fn test_session_can_be_shared_across_threads() {
    let session = Arc::new(session());
    session.train(&SvdConfig::new(2)).unwrap();

    let handles: Vec<_> = (1..=4u32)
        .map(|user| {
            let session = Arc::clone(&session);
            std::thread::spawn(move || session.recommend(user, 3).unwrap())
        })
        .collect();

    for handle in handles {
        let recs = handle.join().unwrap().unwrap();
        assert!(recs.len() <= 3);
    }
}
