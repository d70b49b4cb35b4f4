//! Integration tests for the pipeline.
//!
//! These tests run the whole core in a realistic order: load the tables,
//! build the matrix, train, recommend, enrich.

use data_loader::{parser, Dataset, Item, Transaction};
use model::{build_matrix, train, DuplicatePolicy, Solver, SvdConfig};
use pipeline::{enrich, recommend, RecommendError, Recommender};

const TRANSACTIONS_CSV: &str = "\
TransactionId,UserId,VisitYear,VisitMonth,AttractionId,Rating
1,1,2022,1,10,5
2,1,2022,2,20,4
3,1,2022,3,30,1
4,2,2022,1,10,4
5,2,2022,2,20,5
6,2,2022,5,40,2
7,3,2022,1,30,5
8,3,2022,2,40,4
9,3,2022,3,50,5
10,4,2022,4,20,4
11,4,2022,5,10,5
12,4,2022,6,60,1
13,5,2022,1,50,4
14,5,2022,2,40,5
15,5,2022,3,30,4
16,6,2022,4,60,3
17,6,2022,5,10,2
";

const ITEMS_CSV: &str = "\
AttractionId,Attraction,AttractionTypeId
10,Kuta Beach,13
20,Tanah Lot,44
30,Borobudur,63
40,Merapi Volcano,72
50,Sacred Monkey Forest,13
";

fn load() -> Dataset {
    let transactions =
        parser::parse_transactions_from_reader(TRANSACTIONS_CSV.as_bytes(), "Transaction.csv").unwrap();
    let items = parser::parse_items_from_reader(ITEMS_CSV.as_bytes(), "Item.csv").unwrap();
    Dataset::from_parts(transactions, items).unwrap()
}

#[test]
fn test_end_to_end_recommendations() {
    let dataset = load();
    let matrix = build_matrix(dataset.transactions(), DuplicatePolicy::Mean).unwrap();
    assert_eq!(matrix.shape(), (6, 6));

    let model = train(&matrix, &SvdConfig::new(3)).unwrap();

    let recs = recommend(1, &matrix, Some(model.predicted()), 5).unwrap().unwrap();
    // User 1 visited 10, 20, 30; three attractions remain
    assert_eq!(recs.len(), 3);
    assert!(recs.iter().all(|c| ![10, 20, 30].contains(&c.attraction_id)));
    assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));

    let enriched = enrich(&recs, &dataset);
    for rec in &enriched {
        match rec.attraction_id {
            40 => assert_eq!(rec.name.as_deref(), Some("Merapi Volcano")),
            50 => assert_eq!(rec.name.as_deref(), Some("Sacred Monkey Forest")),
            // 60 has transactions but no item row
            60 => assert_eq!(rec.name, None),
            other => panic!("unexpected attraction {other}"),
        }
    }
}

#[test]
fn test_recommend_before_training_fails_predictably() {
    let dataset = load();
    let matrix = build_matrix(dataset.transactions(), DuplicatePolicy::Mean).unwrap();

    let err = Recommender::new().recommend(1, &matrix, None, 5).unwrap_err();
    assert!(matches!(err, RecommendError::ModelNotTrained));
}

#[test]
fn test_unknown_user_distinct_from_empty() {
    let dataset = Dataset::from_parts(
        vec![
            Transaction::new(1, 10, 5.0),
            Transaction::new(1, 20, 3.0),
            Transaction::new(2, 10, 4.0),
        ],
        vec![Item::new(10, "A"), Item::new(20, "B"), Item::new(30, "C")],
    )
    .unwrap();
    let matrix = build_matrix(dataset.transactions(), DuplicatePolicy::Mean).unwrap();
    let model = train(&matrix, &SvdConfig::new(1)).unwrap();

    // Known user with nothing left to recommend
    let empty = recommend(1, &matrix, Some(model.predicted()), 5).unwrap();
    assert_eq!(empty, Some(Vec::new()));

    // User that never appears in the transactions
    let unknown = recommend(3, &matrix, Some(model.predicted()), 5).unwrap();
    assert_eq!(unknown, None);
}

#[test]
fn test_repeated_training_gives_identical_recommendations() {
    let dataset = load();
    let matrix = build_matrix(dataset.transactions(), DuplicatePolicy::Mean).unwrap();

    for solver in [Solver::Randomized, Solver::Exact] {
        let config = SvdConfig::new(2).with_solver(solver);
        let first = train(&matrix, &config).unwrap();
        let second = train(&matrix, &config).unwrap();

        for &user in matrix.user_ids() {
            let a = recommend(user, &matrix, Some(first.predicted()), 5).unwrap();
            let b = recommend(user, &matrix, Some(second.predicted()), 5).unwrap();
            assert_eq!(a, b);
        }
    }
}
