//! Integration tests for paging through the in-memory engine.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use keyset_core::catalog::{EntityDef, FieldDef, FieldType, ScalarType, SchemaBundle};
use keyset_core::codec::token;
use keyset_core::query::{MemoryEngine, MemoryRow, PlaceholderStyle};
use keyset_core::{Error, Page, PagePlan, Paginator, PaginatorConfig, Rfc3339TimestampCodec, Rule};
use keyset_proto::{Cursor, Direction, Order, Value};
use std::sync::Arc;

const T1: i64 = 1_704_067_200_000_000;
const T2: i64 = T1 + 60_000_000;
const T3: i64 = T2 + 60_000_000;

struct TestContext {
    schema: SchemaBundle,
    engine: MemoryEngine,
}

impl TestContext {
    fn new() -> Self {
        init_tracing();

        let event = EntityDef::new("Event", "events")
            .with_field(FieldDef::new("id", FieldType::scalar(ScalarType::Int64)))
            .with_field(
                FieldDef::new("created_at", FieldType::scalar(ScalarType::Timestamp))
                    .with_column("created"),
            )
            .with_field(FieldDef::optional_scalar("nickname", ScalarType::String));

        let engine = MemoryEngine::new(vec![
            event_row(T2, 5),
            event_row(T1, 1),
            event_row(T3, 9),
            event_row(T1, 3),
            event_row(T2, 7),
        ]);

        Self {
            schema: SchemaBundle::new(1).with_entity(event),
            engine,
        }
    }

    fn plan(&self, paginator: &Paginator) -> PagePlan {
        paginator.compile(&self.schema, "Event").unwrap()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn event_row(created_at: i64, id: i64) -> MemoryRow {
    MemoryRow::new()
        .with("created_at", Value::Timestamp(created_at))
        .with("id", id)
}

fn keys(page: &Page<MemoryRow>) -> Vec<(i64, i64)> {
    page.rows
        .iter()
        .map(|row| {
            (
                row.get("created_at").and_then(Value::as_timestamp).unwrap(),
                row.get("id").and_then(Value::as_i64).unwrap(),
            )
        })
        .collect()
}

fn newest_first(limit: usize) -> Paginator {
    let mut paginator = Paginator::new();
    paginator
        .set_rules([Rule::desc("created_at"), Rule::desc("id")])
        .set_limit(limit);
    paginator
}

#[test]
fn test_tie_break_across_pages() {
    let ctx = TestContext::new();
    let plan = ctx.plan(&newest_first(2));

    let first = plan.paginate(&ctx.engine, &Cursor::new()).unwrap();
    assert_eq!(keys(&first), vec![(T3, 9), (T2, 7)]);
    assert!(first.has_more);
    assert_eq!(
        first.cursor.after,
        Some(plan.encode_values(&[Value::Timestamp(T2), Value::Int64(7)]).unwrap())
    );
    assert_eq!(first.cursor.before, None);

    let after = first.cursor.after.clone().unwrap();
    let second = plan.paginate(&ctx.engine, &Cursor::after(after)).unwrap();
    assert_eq!(keys(&second), vec![(T2, 5), (T1, 3)]);
    assert!(second.has_more);
    assert!(second.cursor.before.is_some());
}

#[test]
fn test_backward_symmetry() {
    let ctx = TestContext::new();
    let plan = ctx.plan(&newest_first(2));

    let before = plan
        .encode_values(&[Value::Timestamp(T2), Value::Int64(5)])
        .unwrap();
    let page = plan.paginate(&ctx.engine, &Cursor::before(before)).unwrap();

    assert_eq!(keys(&page), vec![(T3, 9), (T2, 7)]);
    assert!(!page.has_more);
    assert!(page.cursor.before.is_none());
    assert_eq!(
        page.cursor.after,
        Some(plan.encode_values(&[Value::Timestamp(T2), Value::Int64(7)]).unwrap())
    );
}

#[test]
fn test_has_more_boundary() {
    let ctx = TestContext::new();
    let plan = ctx.plan(&newest_first(5));

    let query = plan.build_query(&Cursor::new()).unwrap();
    assert_eq!(query.spec.limit, 6);

    let page = plan.paginate(&ctx.engine, &Cursor::new()).unwrap();
    assert_eq!(page.rows.len(), 5);
    assert!(!page.has_more);
    assert!(page.cursor.after.is_none());
    assert!(page.cursor.before.is_none());
}

#[test]
fn test_walk_forward_then_back() {
    let ctx = TestContext::new();
    let plan = ctx.plan(&newest_first(2));

    let mut seen = Vec::new();
    let mut cursor = Cursor::new();
    let mut pages = Vec::new();
    loop {
        let page = plan.paginate(&ctx.engine, &cursor).unwrap();
        seen.extend(keys(&page));
        pages.push(keys(&page));
        match page.cursor.after {
            Some(after) => cursor = Cursor::after(after),
            None => {
                cursor = Cursor::before(page.cursor.before.unwrap());
                break;
            }
        }
    }

    assert_eq!(
        seen,
        vec![(T3, 9), (T2, 7), (T2, 5), (T1, 3), (T1, 1)]
    );
    assert_eq!(pages.len(), 3);

    // Walk back from the last page.
    let back = plan.paginate(&ctx.engine, &cursor).unwrap();
    assert_eq!(keys(&back), pages[1]);
    assert!(back.has_more);

    let back = plan
        .paginate(&ctx.engine, &Cursor::before(back.cursor.before.unwrap()))
        .unwrap();
    assert_eq!(keys(&back), pages[0]);
    assert!(!back.has_more);
}

#[test]
fn test_predicate_shape() {
    let ctx = TestContext::new();
    let mut paginator = Paginator::new();
    paginator
        .set_rules([
            Rule::asc("a").with_expr("a"),
            Rule::asc("b").with_expr("b"),
            Rule::asc("c").with_expr("c"),
        ])
        .set_limit(10);
    let plan = ctx.plan(&paginator);

    let token = plan
        .encode_values(&[Value::Int64(1), Value::Int64(2), Value::Int64(3)])
        .unwrap();
    let query = plan.build_query(&Cursor::after(token)).unwrap();

    assert_eq!(query.direction, Direction::Forward);
    assert_eq!(
        query.spec.args,
        [1, 1, 2, 1, 2, 3].map(Value::Int64).to_vec()
    );
    assert_eq!(
        query.inline_sql().unwrap(),
        "WHERE a > 1 OR (a = 1 AND b > 2) OR (a = 1 AND b = 2 AND c > 3) \
         ORDER BY a ASC, b ASC, c ASC LIMIT 11"
    );
}

#[test]
fn test_empty_first_page_query() {
    let ctx = TestContext::new();
    let plan = ctx.plan(&newest_first(10));
    let query = plan.build_query(&Cursor::new()).unwrap();

    assert!(query.spec.is_unbounded());
    assert!(query.sql().where_clause.is_none());
    assert_eq!(
        query.inline_sql().unwrap(),
        "ORDER BY events.created DESC, events.id DESC LIMIT 11"
    );

    let empty = MemoryEngine::<MemoryRow>::new(Vec::new());
    let page = plan.paginate(&empty, &Cursor::new()).unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.cursor, Cursor::new());
}

#[test]
fn test_null_replacement_end_to_end() {
    let ctx = TestContext::new();
    let engine = MemoryEngine::new(vec![
        MemoryRow::new().with("id", 1i64).with("nickname", Value::Null),
        MemoryRow::new().with("id", 2i64).with("nickname", "b"),
        MemoryRow::new().with("id", 3i64).with("nickname", Value::Null),
        MemoryRow::new().with("id", 4i64).with("nickname", "a"),
    ]);
    let mut paginator = Paginator::new();
    paginator
        .set_rules([Rule::asc("nickname").with_null_replacement(""), Rule::asc("id")])
        .set_limit(2);
    let plan = ctx.plan(&paginator);

    assert_eq!(plan.rules()[0].expr(), "COALESCE(events.nickname, '')");

    let ids = |page: &Page<MemoryRow>| -> Vec<i64> {
        page.rows
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .collect()
    };

    let first = plan.paginate(&engine, &Cursor::new()).unwrap();
    assert_eq!(ids(&first), vec![1, 3]);

    let after = first.cursor.after.unwrap();
    let query = plan.build_query(&Cursor::after(after.clone())).unwrap();
    assert_eq!(
        query.spec.args,
        vec![
            Value::String(String::new()),
            Value::String(String::new()),
            Value::Int64(3)
        ]
    );

    let second = plan.paginate(&engine, &Cursor::after(after)).unwrap();
    assert_eq!(ids(&second), vec![4, 2]);
    assert!(!second.has_more);
}

#[test]
fn test_custom_codec_tokens() {
    let ctx = TestContext::new();
    let mut paginator = Paginator::new();
    paginator
        .set_rules([
            Rule::desc("created_at").with_codec(Arc::new(Rfc3339TimestampCodec)),
            Rule::desc("id"),
        ])
        .set_limit(2);
    let plan = ctx.plan(&paginator);

    let first = plan.paginate(&ctx.engine, &Cursor::new()).unwrap();
    let after = first.cursor.after.unwrap();
    let payload = String::from_utf8(token::open(&after, 8 * 1024).unwrap()).unwrap();
    assert!(payload.contains(r#""t":"rfc3339","v":"2024-01-01T00:01:00Z""#));

    let second = plan.paginate(&ctx.engine, &Cursor::after(after)).unwrap();
    assert_eq!(keys(&second), vec![(T2, 5), (T1, 3)]);

    // A token minted without the codec is rejected.
    let native = ctx.plan(&newest_first(2));
    let token = native
        .encode_values(&[Value::Timestamp(T2), Value::Int64(7)])
        .unwrap();
    assert!(matches!(
        plan.paginate(&ctx.engine, &Cursor::after(token)),
        Err(Error::InvalidCursor)
    ));
}

#[test]
fn test_tampered_cursor_is_rejected() {
    let ctx = TestContext::new();
    let plan = ctx.plan(&newest_first(2));
    let first = plan.paginate(&ctx.engine, &Cursor::new()).unwrap();
    let after = first.cursor.after.unwrap();

    let json = String::from_utf8(URL_SAFE_NO_PAD.decode(&after).unwrap()).unwrap();
    let forged = URL_SAFE_NO_PAD.encode(json.replace(r#""k":"id""#, r#""k":"owner""#));

    for bad in [forged, after[..after.len() - 3].to_string(), "x".repeat(9000)] {
        let err = plan.paginate(&ctx.engine, &Cursor::after(bad)).unwrap_err();
        assert!(matches!(err, Error::InvalidCursor));
        assert_eq!(err.to_string(), "invalid cursor");
    }
}

#[test]
fn test_config_driven_paginator() {
    let ctx = TestContext::new();
    let config = PaginatorConfig::from_json(
        r#"{"keys":["created_at","id"],"limit":3,"order":"asc","placeholder":"dollar"}"#,
    )
    .unwrap();
    let plan = ctx.plan(&Paginator::from_config(&config));

    assert_eq!(plan.placeholder(), PlaceholderStyle::Dollar);
    assert!(plan.rules().iter().all(|r| r.order() == Order::Asc));

    let first = plan.paginate(&ctx.engine, &Cursor::new()).unwrap();
    assert_eq!(keys(&first), vec![(T1, 1), (T1, 3), (T2, 5)]);

    let query = plan
        .build_query(&Cursor::after(first.cursor.after.unwrap()))
        .unwrap();
    assert_eq!(
        query.sql().tail(),
        "WHERE events.created > $1 OR (events.created = $2 AND events.id > $3) \
         ORDER BY events.created ASC, events.id ASC LIMIT 4"
    );
}

#[test]
fn test_shared_plan_across_threads() {
    let ctx = TestContext::new();
    let plan = Arc::new(ctx.plan(&newest_first(2)));
    let engine = Arc::new(ctx.engine);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let plan = Arc::clone(&plan);
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let page = plan.paginate(engine.as_ref(), &Cursor::new()).unwrap();
                page.rows.len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
