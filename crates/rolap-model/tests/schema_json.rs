use pretty_assertions::assert_eq;
use rolap_model::{
    Aggregator, CatalogConfig, CubeDimension, Expression, MemberReaderKind, ModelError, Relation,
    Schema, SqlFragment,
};

const SALES_SCHEMA: &str = r#"{
  "name": "FoodMart",
  "dimensions": [
    {
      "name": "Time",
      "hierarchies": [
        {
          "primaryKey": "time_id",
          "relation": { "type": "table", "name": "time_by_day" },
          "levels": [
            { "name": "Year", "table": "time_by_day",
              "key": { "type": "column", "table": "time_by_day", "name": "the_year" } },
            { "name": "Month", "table": "time_by_day",
              "key": { "type": "column", "table": "time_by_day", "name": "month_of_year" },
              "nameExpression": { "type": "sql", "fragments": [
                { "dialect": "generic", "sql": "month_name" },
                { "dialect": "postgres", "sql": "to_char(the_date, 'Mon')" }
              ] } }
          ]
        }
      ]
    }
  ],
  "cubes": [
    {
      "name": "Sales",
      "fact": {
        "type": "table",
        "name": "sales_fact_1997",
        "filters": [ { "dialect": "generic", "sql": "store_id < 100" } ]
      },
      "dimensions": [
        { "kind": "usage", "name": "Time", "source": "Time", "foreignKey": "time_id" },
        { "kind": "private", "name": "Promotion Media", "foreignKey": "promotion_id",
          "hierarchies": [ {
            "primaryKey": "promotion_id",
            "relation": { "type": "table", "name": "promotion" },
            "memberReader": "cached",
            "levels": [ { "name": "Media Type",
              "key": { "type": "column", "table": "promotion", "name": "media_type" } } ]
          } ] }
      ],
      "measures": [
        { "name": "Unit Sales", "expression": { "type": "column", "name": "unit_sales" } },
        { "name": "Customer Count", "aggregator": "distinctCount",
          "expression": { "type": "column", "name": "customer_id" } }
      ]
    }
  ]
}"#;

#[test]
fn schema_loads_from_json() {
    let schema = Schema::from_json(SALES_SCHEMA).unwrap();
    assert_eq!(schema.name, "FoodMart");

    let time = schema.shared_dimension("Time").unwrap();
    let month = time.hierarchies[0].level("Month").unwrap();
    assert_eq!(month.table_name(), Some("time_by_day"));
    let name_expr = month.name_expression.as_ref().unwrap();
    assert_eq!(name_expr.sql_for("postgres"), Some("to_char(the_date, 'Mon')"));
    assert_eq!(name_expr.sql_for("mysql"), Some("month_name"));

    let sales = schema.cube("Sales").unwrap();
    let fact = sales.fact_table().unwrap();
    assert_eq!(fact.alias(), "sales_fact_1997");
    assert_eq!(fact.filters, vec![SqlFragment::generic("store_id < 100")]);

    assert_eq!(sales.dimensions.len(), 2);
    assert_eq!(sales.dimensions[0].foreign_key(), Some("time_id"));
    match &sales.dimensions[1] {
        CubeDimension::Private(dim) => {
            assert_eq!(dim.hierarchies[0].member_reader.as_deref(), Some("cached"));
        }
        other => panic!("expected a private dimension, got {other:?}"),
    }

    assert_eq!(sales.measures[0].aggregator, Aggregator::Sum);
    assert_eq!(sales.measures[1].aggregator, Aggregator::DistinctCount);
    assert_eq!(
        sales.measures[1].expression,
        Expression::unqualified("customer_id")
    );
}

#[test]
fn shared_dimensions_resolve_through_the_cube() {
    let schema = Schema::from_json(SALES_SCHEMA).unwrap();
    let sales = schema.cube("Sales").unwrap();
    let time = sales.resolve_dimension(&schema, &sales.dimensions[0]).unwrap();
    assert_eq!(time.name, "Time");

    let mut broken = sales.clone();
    broken.dimensions[0] = rolap_model::DimensionUsage::new("Time", "Calendar").into();
    let err = broken
        .resolve_dimension(&schema, &broken.dimensions[0])
        .unwrap_err();
    assert!(matches!(err, ModelError::UnknownSharedDimension { .. }));
}

#[test]
fn join_fact_is_rejected() {
    let mut schema = Schema::from_json(SALES_SCHEMA).unwrap();
    schema.cubes[0].fact = Relation::join(
        Relation::table("a"),
        "id",
        Relation::table("b"),
        "id",
    );
    assert_eq!(
        schema.cubes[0].fact_table().unwrap_err().to_string(),
        "fact of cube Sales must be a table, not a join"
    );
}

#[test]
fn malformed_json_is_an_error() {
    assert!(matches!(
        Schema::from_json("{ \"name\": 3 }"),
        Err(ModelError::Json(_))
    ));
}

#[test]
fn config_defaults_fill_missing_fields() {
    let config = CatalogConfig::from_json(r#"{ "strictLevelTables": true }"#).unwrap();
    assert!(config.strict_level_tables);
    assert!(config.canonicalize_all_snowflakes);
    assert_eq!(config.initial_column_capacity, 0);

    let config =
        CatalogConfig::from_json(r#"{ "memberReaders": { "warm": "cached" } }"#).unwrap();
    assert_eq!(config.member_readers.get("warm"), Some(&MemberReaderKind::Cached));
    assert_eq!(CatalogConfig::from_json("{}").unwrap(), CatalogConfig::default());

    let config =
        CatalogConfig::from_json(r#"{ "canonicalizeAllSnowflakes": false }"#).unwrap();
    assert!(!config.canonicalize_all_snowflakes);
}
