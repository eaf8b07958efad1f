use pantry_core::filter::{Direction, Fields, Filter, FilterError, Where};
use pantry_core::schema::Document;
use serde_json::{Value, json};

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn recipes() -> Vec<Document> {
    vec![
        doc(json!({"id": 3, "title": "Curry", "cost": 12, "created_at": "2024-03-01T00:00:00Z"})),
        doc(json!({"id": 1, "title": "Soup", "cost": 3, "created_at": "2024-01-01T00:00:00Z"})),
        doc(json!({"id": 2, "title": "Salad", "cost": 8.5, "tags": {"diet": "vegan"}})),
        doc(json!({"id": 10, "title": "stew", "cost": 20})),
    ]
}

fn ids(docs: &[Document]) -> Vec<u64> {
    docs.iter().filter_map(|d| d["id"].as_u64()).collect()
}

fn select(where_json: Value) -> Vec<u64> {
    let filter = Filter::with_where(Where::from_value(&where_json).unwrap());
    ids(&filter.apply(recipes(), "id"))
}

#[test]
fn default_order_is_numeric_id() {
    let all = Filter::default().apply(recipes(), "id");
    assert_eq!(ids(&all), [1, 2, 3, 10]);
}

#[test]
fn comparison_operators() {
    assert_eq!(select(json!({"cost": {"gt": 10}})), [3, 10]);
    assert_eq!(select(json!({"cost": {"gte": 12}})), [3, 10]);
    assert_eq!(select(json!({"cost": {"lt": 8.5}})), [1]);
    assert_eq!(select(json!({"cost": {"between": [3, 12]}})), [1, 2, 3]);
    assert_eq!(select(json!({"cost": {"neq": 3}})), [2, 3, 10]);
    assert_eq!(select(json!({"id": {"inq": [1, 10, 99]}})), [1, 10]);
    assert_eq!(select(json!({"id": {"nin": [1, 10]}})), [2, 3]);
}

#[test]
fn plain_values_mean_equality() {
    assert_eq!(select(json!({"title": "Soup"})), [1]);
    assert_eq!(select(json!({"title": "Soup", "cost": 4})), Vec::<u64>::new());
    assert_eq!(select(json!({"created_at": null})), [2, 10]);
}

#[test]
fn numeric_strings_are_coerced() {
    assert_eq!(select(json!({"cost": {"gt": "10"}})), [3, 10]);
    assert_eq!(select(json!({"id": "2"})), [2]);
}

#[test]
fn logical_combinators() {
    assert_eq!(
        select(json!({"or": [{"title": "Soup"}, {"cost": {"gte": 20}}]})),
        [1, 10]
    );
    assert_eq!(
        select(json!({"and": [{"cost": {"gt": 3}}, {"cost": {"lt": 20}}]})),
        [2, 3]
    );
    assert_eq!(select(json!({})), [1, 2, 3, 10]);
}

#[test]
fn patterns() {
    assert_eq!(select(json!({"title": {"like": "S%"}})), [1, 2]);
    assert_eq!(select(json!({"title": {"ilike": "s%"}})), [1, 2, 10]);
    assert_eq!(select(json!({"title": {"nlike": "S%"}})), [3, 10]);
    assert_eq!(select(json!({"title": {"like": "So_p"}})), [1]);
    assert_eq!(select(json!({"title": {"regexp": "^s"}})), [10]);
    assert_eq!(select(json!({"title": {"regexp": "/^s/i"}})), [1, 2, 10]);
}

#[test]
fn timestamps_compare_chronologically() {
    assert_eq!(
        select(json!({"created_at": {"gt": "2024-02-01T00:00:00+00:00"}})),
        [3]
    );
}

#[test]
fn nested_paths() {
    assert_eq!(select(json!({"tags.diet": "vegan"})), [2]);
}

#[test]
fn order_limit_skip_and_fields() {
    let filter = Filter::from_value(&json!({
        "order": ["cost DESC"],
        "skip": 1,
        "limit": 2,
        "fields": {"title": true, "id": true}
    }))
    .unwrap();
    assert_eq!(filter.order[0].direction, Direction::Desc);

    let out = filter.apply(recipes(), "id");
    assert_eq!(ids(&out), [3, 2]);
    assert!(out.iter().all(|d| d.len() == 2 && d.contains_key("title")));
}

#[test]
fn field_exclusion_and_string_flags() {
    let filter = Filter::from_value(&json!({"fields": {"cost": "false"}, "limit": "1"})).unwrap();
    assert_eq!(filter.fields, Some(Fields::Exclude(vec!["cost".to_string()])));
    assert_eq!(filter.limit, Some(1));

    let out = filter.apply(recipes(), "id");
    assert_eq!(out.len(), 1);
    assert!(!out[0].contains_key("cost"));
}

#[test]
fn invalid_filters_are_rejected() {
    assert!(matches!(
        Where::from_value(&json!({"cost": {"greater": 3}})),
        Err(FilterError::UnknownOperator { .. })
    ));
    assert!(Where::from_value(&json!({"cost": {"between": [1]}})).is_err());
    assert!(Where::from_value(&json!({"title": {"regexp": "("}})).is_err());
    assert!(Where::from_value(&json!([1, 2])).is_err());
    assert!(matches!(
        Filter::from_value(&json!({"sort": "cost"})),
        Err(FilterError::UnknownKey(_))
    ));
    assert!(Filter::from_value(&json!({"limit": -1})).is_err());
    assert!(Filter::from_value(&json!({"order": "cost SIDEWAYS"})).is_err());
    assert!(matches!(
        Filter::from_value(&json!({"include": ["author"]})),
        Err(FilterError::NoRelations)
    ));
}

#[test]
fn excluding_where_rejects_where() {
    assert!(matches!(
        Filter::excluding_where(&json!({"where": {"id": 1}})),
        Err(FilterError::WhereNotAllowed)
    ));
    assert!(Filter::excluding_where(&json!({"fields": ["title"]})).is_ok());
}
