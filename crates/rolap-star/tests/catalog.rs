use std::sync::Arc;

use pretty_assertions::assert_eq;
use rolap_model::{
    Aggregator, CatalogConfig, Cube, Dimension, DimensionUsage, Expression, Hierarchy, Join,
    Level, Measure, MemberReaderKind, Relation, Schema, Table,
};
use rolap_star::{
    lock_star, BitKey, Catalog, CatalogError, ColumnKind, StarError, UsageKind, WarningKind,
};

fn time() -> Dimension {
    Dimension::new(
        "Time",
        vec![Hierarchy::new(vec![
            Level::all(),
            Level::keyed("Year", "time_by_day", "the_year"),
            Level::keyed("Quarter", "time_by_day", "quarter"),
            Level::keyed("Month", "time_by_day", "month_of_year"),
        ])
        .with_relation(Table::new("time_by_day"))
        .with_primary_key("time_id")],
    )
}

fn product() -> Dimension {
    Dimension::new(
        "Product",
        vec![Hierarchy::new(vec![
            Level::all(),
            Level::keyed("Family", "product_class", "product_family"),
            Level::keyed("Category", "product_class", "product_category"),
            Level::keyed("Brand", "product", "brand_name"),
            Level::keyed("Product", "product", "product_name"),
        ])
        .with_relation(Relation::join(
            Relation::table("product"),
            "product_class_id",
            Relation::table("product_class"),
            "product_class_id",
        ))
        .with_primary_key("product_id")
        .with_primary_key_table("product")],
    )
}

fn store() -> Dimension {
    Dimension::new(
        "Store",
        vec![Hierarchy::new(vec![
            Level::all(),
            Level::keyed("Country", "store", "store_country"),
            Level::keyed("State", "store", "store_state"),
            Level::keyed("City", "store", "store_city"),
        ])
        .with_relation(Table::new("store"))
        .with_primary_key("store_id")
        .with_member_reader("cached")],
    )
    .with_foreign_key("store_id")
}

/// Read straight from the fact table.
fn payment() -> Dimension {
    Dimension::new(
        "Payment",
        vec![Hierarchy::new(vec![
            Level::all(),
            Level::new("Method").with_key(Expression::unqualified("payment_method")),
        ])],
    )
}

fn sales_fact() -> Table {
    Table::new("sales_fact_1997").with_alias("sales")
}

fn unit_sales() -> Measure {
    Measure::new(
        "Unit Sales",
        Expression::unqualified("unit_sales"),
        Aggregator::Sum,
    )
}

fn sales_cube() -> Cube {
    Cube::new("Sales", sales_fact())
        .with_dimension(DimensionUsage::new("Ship Date", "Time").with_foreign_key("ship_date_id"))
        .with_dimension(DimensionUsage::new("Order Date", "Time").with_foreign_key("order_date_id"))
        .with_dimension(DimensionUsage::new("Product", "Product").with_foreign_key("product_id"))
        .with_dimension(store())
        .with_dimension(payment())
        .with_measure(unit_sales())
        .with_measure(Measure::new(
            "Customer Count",
            Expression::unqualified("customer_id"),
            Aggregator::DistinctCount,
        ))
}

fn foodmart(cubes: Vec<Cube>) -> Schema {
    let mut schema = Schema::new("FoodMart");
    schema.dimensions = vec![time(), product()];
    schema.cubes = cubes;
    schema
}

fn load(schema: &Schema) -> Catalog {
    Catalog::load(schema, &CatalogConfig::default()).expect("schema loads")
}

#[test]
fn sales_cube_registers_every_dimension() {
    let catalog = load(&foodmart(vec![sales_cube()]));
    assert_eq!(catalog.schema_name(), "FoodMart");
    assert!(catalog.warnings().is_empty(), "{:?}", catalog.warnings());

    let names: Vec<&str> = catalog
        .usages("Sales")
        .iter()
        .map(|u| u.name.as_str())
        .collect();
    assert_eq!(
        names,
        ["Ship Date", "Order Date", "Product", "Store", "Payment"]
    );

    let shared = catalog.star_for_cube("Sales").unwrap();
    let star = lock_star(&shared);
    // 3 + 3 time levels, 4 product, 3 store, 1 payment, 2 measures.
    assert_eq!(star.column_count(), 16);
    assert_eq!(star.allocated_key(), BitKey::from_positions(0..16));
    // sales, time_by_day, time_by_day_1, product, product_class, store
    assert_eq!(star.table_count(), 6);

    let brand = catalog.level_column("Sales", "Product", "Brand").unwrap();
    assert_eq!(star.table(star.column(brand).table()).alias(), "product");
    let family = catalog.level_column("Sales", "Product", "Family").unwrap();
    assert_eq!(
        star.table(star.column(family).table()).alias(),
        "product_class"
    );
    let category = catalog.level_column("Sales", "Product", "Category");
    assert_eq!(star.column(brand).parent_column(), category);
}

#[test]
fn role_playing_usages_get_their_own_tables() {
    let catalog = load(&foodmart(vec![sales_cube()]));
    let usages = catalog.usages("Sales");
    assert_eq!(usages[0].usage_prefix.as_deref(), Some("ship_date_"));
    assert_eq!(usages[1].usage_prefix.as_deref(), Some("order_date_"));
    assert_eq!(usages[2].usage_prefix, None);
    assert_eq!(usages[0].kind, UsageKind::Shared);
    assert_eq!(usages[0].source.as_deref(), Some("Time"));
    assert_eq!(usages[3].kind, UsageKind::Private);

    let ship = catalog.level_column("Sales", "Ship Date", "Year").unwrap();
    let order = catalog.level_column("Sales", "Order Date", "Year").unwrap();
    assert_ne!(ship, order);

    let shared = catalog.star_for_cube("Sales").unwrap();
    let star = lock_star(&shared);
    let ship_table = star.table(star.column(ship).table());
    let order_table = star.table(star.column(order).table());
    assert_eq!(ship_table.alias(), "time_by_day");
    assert_eq!(order_table.alias(), "time_by_day_1");
    assert_eq!(
        order_table.join().unwrap().condition.left,
        Expression::column("sales", "order_date_id")
    );
    assert_eq!(star.column(order).usage_prefix(), Some("order_date_"));
    assert_eq!(
        star.column(order).expression(),
        &Expression::column("time_by_day_1", "the_year")
    );
}

#[test]
fn degenerate_dimension_reads_the_fact_table() {
    let catalog = load(&foodmart(vec![sales_cube()]));
    let payment = catalog.usages("Sales")[4];
    assert!(payment.in_fact_table());
    assert_eq!(payment.foreign_key, None);

    let method = catalog.level_column("Sales", "Payment", "Method").unwrap();
    let shared = catalog.star_for_cube("Sales").unwrap();
    let star = lock_star(&shared);
    assert_eq!(star.column(method).table(), star.fact_table_id());
    assert_eq!(
        star.column(method).expression(),
        &Expression::column("sales", "payment_method")
    );
}

#[test]
fn measures_are_fact_columns() {
    let catalog = load(&foodmart(vec![sales_cube()]));
    let unit_sales = catalog.measure_column("Sales", "Unit Sales").unwrap();
    let customers = catalog.measure_column("Sales", "Customer Count").unwrap();
    assert_eq!(catalog.measure_column("Sales", "Profit"), None);

    let shared = catalog.star_for_cube("Sales").unwrap();
    let star = lock_star(&shared);
    assert_eq!(
        star.column(customers).kind(),
        ColumnKind::Measure(Aggregator::DistinctCount)
    );
    assert_eq!(star.column(unit_sales).table(), star.fact_table_id());
}

#[test]
fn cubes_on_one_fact_table_share_the_star() {
    let second = Cube::new("Sales Lite", sales_fact())
        .with_dimension(DimensionUsage::new("Ship Date", "Time").with_foreign_key("ship_date_id"))
        .with_dimension(store())
        .with_measure(unit_sales());
    let catalog = load(&foodmart(vec![sales_cube(), second]));

    let a = catalog.star_for_cube("Sales").unwrap();
    let b = catalog.star_for_cube("Sales Lite").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(catalog.registry().len(), 1);
    assert_eq!(
        catalog.cube_names().collect::<Vec<_>>(),
        ["Sales", "Sales Lite"]
    );

    // Everything the second cube needs is already there.
    assert_eq!(lock_star(&a).column_count(), 16);
    assert_eq!(
        catalog.level_column("Sales Lite", "Store", "City"),
        catalog.level_column("Sales", "Store", "City")
    );
    assert_eq!(
        catalog.level_column("Sales Lite", "Ship Date", "Month"),
        catalog.level_column("Sales", "Ship Date", "Month")
    );
}

#[test]
fn missing_foreign_key_names_schema_and_cube() {
    let cube = Cube::new("Sales", sales_fact()).with_dimension(DimensionUsage::new("Time", "Time"));
    let err = Catalog::load(&foodmart(vec![cube]), &CatalogConfig::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "schema FoodMart, cube Sales: hierarchy Time in cube Sales must have a foreign key to the fact table"
    );
    assert!(matches!(err, CatalogError::Star { ref cube, .. } if cube == "Sales"));
}

#[test]
fn missing_primary_key_is_fatal() {
    let mut warehouse = Dimension::new(
        "Warehouse",
        vec![Hierarchy::new(vec![Level::keyed(
            "Warehouse",
            "warehouse",
            "warehouse_name",
        )])
        .with_relation(Table::new("warehouse"))],
    );
    warehouse.foreign_key = Some("warehouse_id".to_string());
    let cube = Cube::new("Inventory", Table::new("inventory_fact_1997")).with_dimension(warehouse);
    let err = Catalog::load(&foodmart(vec![cube]), &CatalogConfig::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "schema FoodMart, cube Inventory: hierarchy Warehouse in cube Inventory must have a primary key"
    );
}

#[test]
fn unknown_shared_dimension_is_a_model_error() {
    let cube = Cube::new("Sales", sales_fact())
        .with_dimension(DimensionUsage::new("Warehouse", "Warehouse").with_foreign_key("wh_id"));
    let err = Catalog::load(&foodmart(vec![cube]), &CatalogConfig::default()).unwrap_err();
    assert!(matches!(err, CatalogError::Model { .. }));
    assert_eq!(
        err.to_string(),
        "schema FoodMart: cube Sales uses unknown shared dimension Warehouse"
    );
}

#[test]
fn duplicate_usage_is_skipped_with_a_warning() {
    let ship = DimensionUsage::new("Ship Date", "Time").with_foreign_key("ship_date_id");
    let cube = Cube::new("Sales", sales_fact())
        .with_dimension(ship.clone())
        .with_dimension(ship);
    let catalog = load(&foodmart(vec![cube]));

    assert_eq!(catalog.usages("Sales").len(), 1);
    let kinds: Vec<WarningKind> = catalog.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(kinds, [WarningKind::DuplicateUsage]);

    let shared = catalog.star_for_cube("Sales").unwrap();
    assert_eq!(lock_star(&shared).column_count(), 3);
}

fn time_with_weeks() -> Dimension {
    let mut dimension = time();
    dimension.hierarchies.push(
        Hierarchy::new(vec![
            Level::all(),
            Level::keyed("Year", "time_by_day", "the_year"),
            Level::keyed("Week", "time_by_day", "week_of_year"),
        ])
        .with_name("Weekly")
        .with_relation(Table::new("time_by_day"))
        .with_primary_key("time_id"),
    );
    dimension
}

#[test]
fn join_level_selects_hierarchies() {
    let cube = Cube::new("Sales", sales_fact())
        .with_dimension(DimensionUsage::new("Time", "Time").with_foreign_key("time_id"))
        .with_dimension(
            DimensionUsage::new("Week Time", "Time")
                .with_foreign_key("week_id")
                .with_level("Week"),
        );
    let mut schema = foodmart(vec![cube]);
    schema.dimensions = vec![time_with_weeks()];
    let catalog = load(&schema);
    assert!(catalog.warnings().is_empty(), "{:?}", catalog.warnings());

    let hierarchies: Vec<(&str, &str)> = catalog
        .usages("Sales")
        .iter()
        .map(|u| (u.name.as_str(), u.hierarchy_name.as_str()))
        .collect();
    assert_eq!(
        hierarchies,
        [("Time", "Time"), ("Time", "Weekly"), ("Week Time", "Weekly")]
    );

    let week_usage = catalog.usages("Sales")[2];
    assert_eq!(week_usage.level_name.as_deref(), Some("Week"));
    assert_eq!(
        week_usage.join_expression,
        Some(Expression::column("time_by_day", "week_of_year"))
    );
    assert!(catalog.level_column("Sales", "Week Time", "Week").is_some());
    assert!(catalog.level_column("Sales", "Week Time", "Quarter").is_none());
}

#[test]
fn unknown_join_level_falls_back_to_the_first_hierarchy() {
    let cube = Cube::new("Sales", sales_fact()).with_dimension(
        DimensionUsage::new("Day Time", "Time")
            .with_foreign_key("time_id")
            .with_level("Day"),
    );
    let mut schema = foodmart(vec![cube]);
    schema.dimensions = vec![time_with_weeks()];
    let catalog = load(&schema);

    let kinds: Vec<WarningKind> = catalog.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(kinds, [WarningKind::UnknownJoinLevel]);
    let usages = catalog.usages("Sales");
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].hierarchy_name, "Time");
    assert_eq!(
        usages[0].join_expression,
        Some(Expression::column("time_by_day", "time_id"))
    );
    assert!(catalog.level_column("Sales", "Day Time", "Month").is_some());
}

fn link(left: Relation, left_alias: &str, right: Relation, right_alias: &str, key: &str) -> Relation {
    Relation::Join(Box::new(Join {
        left_alias: Some(left_alias.to_string()),
        left_key: key.to_string(),
        left,
        right_alias: Some(right_alias.to_string()),
        right_key: key.to_string(),
        right,
    }))
}

/// Year > Quarter > Month > Day, one table each, joined over `relation`.
fn calendar_over(relation: Relation) -> Dimension {
    Dimension::new(
        "Calendar",
        vec![Hierarchy::new(vec![
            Level::all(),
            Level::keyed("Year", "year", "year_id"),
            Level::keyed("Quarter", "quarter", "quarter_id"),
            Level::keyed("Month", "month", "month_id"),
            Level::keyed("Day", "day", "day_id"),
        ])
        .with_relation(relation)
        .with_primary_key("day_id")
        .with_primary_key_table("day")],
    )
}

/// Declared deepest table first, left-nested.
fn calendar() -> Dimension {
    let day_month = link(
        Relation::table("day"),
        "day",
        Relation::table("month"),
        "month",
        "month_id",
    );
    let to_quarter = link(day_month, "month", Relation::table("quarter"), "quarter", "quarter_id");
    calendar_over(link(to_quarter, "quarter", Relation::table("year"), "year", "year_id"))
}

/// Declared top table first, right-nested.
fn shallow_calendar() -> Dimension {
    let month_day = link(
        Relation::table("month"),
        "month",
        Relation::table("day"),
        "day",
        "month_id",
    );
    let from_quarter = link(Relation::table("quarter"), "quarter", month_day, "month", "quarter_id");
    calendar_over(link(Relation::table("year"), "year", from_quarter, "quarter", "year_id"))
}

fn forecast_chain(star: &rolap_star::Star) -> Vec<String> {
    let mut chain = Vec::new();
    let mut table = star.find_table("year");
    while let Some(t) = table {
        chain.push(t.alias().to_string());
        table = t.parent();
    }
    chain
}

#[test]
fn snowflake_joined_at_a_level_stops_there() {
    let cube = Cube::new("Forecast", Table::new("forecast")).with_dimension(
        DimensionUsage::new("Calendar", "Calendar")
            .with_foreign_key("month_id")
            .with_level("Month"),
    );
    let mut schema = foodmart(vec![cube]);
    schema.dimensions.push(calendar());
    let catalog = load(&schema);
    assert!(catalog.warnings().is_empty(), "{:?}", catalog.warnings());

    let shared = catalog.star_for_cube("Forecast").unwrap();
    let star = lock_star(&shared);
    assert!(star.find_table("day").is_none());
    let month = star.find_table("month").unwrap();
    assert_eq!(month.parent().map(|t| t.alias()), Some("forecast"));
    assert_eq!(
        month.join().unwrap().condition.right,
        Expression::column("month", "month_id")
    );
    assert_eq!(
        star.find_table("year").and_then(|t| t.parent()).map(|t| t.alias()),
        Some("quarter")
    );

    assert!(catalog.level_column("Forecast", "Calendar", "Day").is_none());
    let year = catalog.level_column("Forecast", "Calendar", "Year").unwrap();
    let quarter = catalog.level_column("Forecast", "Calendar", "Quarter").unwrap();
    let month = catalog.level_column("Forecast", "Calendar", "Month").unwrap();
    assert_eq!(star.column(quarter).parent_column(), Some(year));
    assert_eq!(star.column(month).parent_column(), Some(quarter));
    assert_eq!(star.column_count(), 3);
}

#[test]
fn whole_snowflake_joins_as_a_chain() {
    let cube = Cube::new("Forecast", Table::new("forecast")).with_dimension(
        DimensionUsage::new("Calendar", "Calendar").with_foreign_key("day_id"),
    );
    let mut schema = foodmart(vec![cube]);
    schema.dimensions.push(calendar());
    let catalog = load(&schema);
    assert!(catalog.warnings().is_empty(), "{:?}", catalog.warnings());

    let shared = catalog.star_for_cube("Forecast").unwrap();
    let star = lock_star(&shared);
    assert_eq!(forecast_chain(&star), ["year", "quarter", "month", "day", "forecast"]);
    assert_eq!(star.column_count(), 4);
}

#[test]
fn top_first_snowflake_is_reordered_before_joining() {
    let cube = Cube::new("Forecast", Table::new("forecast")).with_dimension(
        DimensionUsage::new("Calendar", "Calendar").with_foreign_key("day_id"),
    );
    let mut schema = foodmart(vec![cube]);
    schema.dimensions.push(shallow_calendar());
    let catalog = load(&schema);
    assert!(catalog.warnings().is_empty(), "{:?}", catalog.warnings());

    let shared = catalog.star_for_cube("Forecast").unwrap();
    let star = lock_star(&shared);
    assert_eq!(forecast_chain(&star), ["year", "quarter", "month", "day", "forecast"]);
    let day = star.find_table("day").unwrap();
    assert_eq!(
        day.join().unwrap().condition,
        rolap_star::JoinCondition::new(
            Expression::column("forecast", "day_id"),
            Expression::column("day", "day_id"),
        )
    );
    let year = star.find_table("year").unwrap();
    assert_eq!(
        year.join().unwrap().condition,
        rolap_star::JoinCondition::new(
            Expression::column("quarter", "year_id"),
            Expression::column("year", "year_id"),
        )
    );

    let quarter = catalog.level_column("Forecast", "Calendar", "Quarter").unwrap();
    let month = catalog.level_column("Forecast", "Calendar", "Month").unwrap();
    assert_eq!(star.column(month).parent_column(), Some(quarter));
}

#[test]
fn top_first_snowflake_without_canonicalization_is_fatal() {
    let cube = Cube::new("Forecast", Table::new("forecast")).with_dimension(
        DimensionUsage::new("Calendar", "Calendar").with_foreign_key("day_id"),
    );
    let mut schema = foodmart(vec![cube]);
    schema.dimensions.push(shallow_calendar());
    let config = CatalogConfig {
        canonicalize_all_snowflakes: false,
        ..CatalogConfig::default()
    };
    let err = Catalog::load(&schema, &config).unwrap_err();
    assert!(matches!(
        &err,
        CatalogError::Star {
            source: StarError::JoinTableNotLeftmost { table, leftmost, .. },
            ..
        } if table == "day" && leftmost == "year"
    ));
    assert_eq!(
        err.to_string(),
        "schema FoodMart, cube Forecast: hierarchy Calendar in cube Forecast joins the fact \
         table through day, but its relation starts with year"
    );
}

#[test]
fn unusable_snowflake_is_joined_as_declared() {
    let mut calendar = calendar();
    // A level with no table defeats canonicalization.
    calendar.hierarchies[0].levels[2] =
        Level::new("Quarter").with_key(Expression::unqualified("quarter_id"));
    let cube = Cube::new("Forecast", Table::new("forecast")).with_dimension(
        DimensionUsage::new("Calendar", "Calendar").with_foreign_key("day_id"),
    );
    let mut schema = foodmart(vec![cube]);
    schema.dimensions.push(calendar);
    let catalog = load(&schema);

    let kinds: Vec<WarningKind> = catalog.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(kinds, [WarningKind::CanonicalizationSkipped]);
    let shared = catalog.star_for_cube("Forecast").unwrap();
    let star = lock_star(&shared);
    assert_eq!(forecast_chain(&star), ["year", "quarter", "month", "day", "forecast"]);
}

#[test]
fn member_readers_resolve_by_name() {
    let mut product = product();
    product.hierarchies[0].member_reader = Some("com.acme.ProductReader".to_string());
    let mut schema = foodmart(vec![sales_cube()]);
    schema.dimensions = vec![time(), product];
    let catalog = load(&schema);

    assert_eq!(
        catalog.member_reader("Sales", "Store"),
        Some(MemberReaderKind::Cached)
    );
    assert_eq!(
        catalog.member_reader("Sales", "Time"),
        Some(MemberReaderKind::Sql)
    );
    assert_eq!(
        catalog.member_reader("Sales", "Product"),
        Some(MemberReaderKind::Sql)
    );
    assert_eq!(catalog.member_reader("Sales", "Warehouse"), None);

    let kinds: Vec<WarningKind> = catalog.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(kinds, [WarningKind::UnknownMemberReader]);
}

#[test]
fn aggregates_match_level_columns() {
    let catalog = load(&foodmart(vec![sales_cube()]));
    let year = catalog.level_column("Sales", "Ship Date", "Year").unwrap();
    let month = catalog.level_column("Sales", "Ship Date", "Month").unwrap();
    let city = catalog.level_column("Sales", "Store", "City").unwrap();
    let unit_sales = catalog.measure_column("Sales", "Unit Sales").unwrap();

    let shared = catalog.star_for_cube("Sales").unwrap();
    let mut star = lock_star(&shared);
    let measures = star.key_for_columns([unit_sales]);
    let by_month = star.key_for_columns([year, month]);
    let by_city = star.key_for_columns([year, month, city]);
    star.add_aggregate("agg_month", &by_month, &measures, Some(24));
    star.add_aggregate("agg_month_city", &by_city, &measures, Some(1_200));

    let wanted = star.key_for_columns([year]);
    let names: Vec<&str> = star
        .matching_aggregates(&wanted, &measures)
        .into_iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, ["agg_month", "agg_month_city"]);

    let wanted = star.key_for_columns([city]);
    assert_eq!(star.matching_aggregates(&wanted, &measures).len(), 1);
}

#[test]
fn flush_empties_the_catalog() {
    let mut catalog = load(&foodmart(vec![sales_cube()]));
    let before = catalog.star_for_cube("Sales").unwrap();
    catalog.flush();

    assert!(catalog.registry().is_empty());
    assert!(catalog.star_for_cube("Sales").is_none());
    assert!(catalog.usages("Sales").is_empty());
    // Stars handed out earlier stay usable.
    assert_eq!(lock_star(&before).column_count(), 16);
}

const SCHEMA_JSON: &str = r#"{
  "name": "Warehouse",
  "dimensions": [
    {
      "name": "Product",
      "hierarchies": [
        {
          "primaryKey": "product_id",
          "primaryKeyTable": "product",
          "relation": {
            "type": "join",
            "leftKey": "product_class_id",
            "left": { "type": "table", "name": "product_class" },
            "rightKey": "product_class_id",
            "right": { "type": "table", "name": "product" }
          },
          "levels": [
            { "name": "Family",
              "key": { "type": "column", "table": "product_class", "name": "product_family" } },
            { "name": "Brand",
              "key": { "type": "column", "table": "product", "name": "brand_name" } }
          ],
          "memberReader": "warm"
        }
      ]
    }
  ],
  "cubes": [
    {
      "name": "Inventory",
      "fact": { "type": "table", "name": "inventory_fact_1997", "alias": "inventory" },
      "dimensions": [
        { "kind": "usage", "name": "Product", "source": "Product", "foreignKey": "product_id" }
      ],
      "measures": [
        { "name": "Units Shipped",
          "expression": { "type": "column", "name": "units_shipped" } }
      ]
    }
  ]
}"#;

#[test]
fn json_schema_loads_with_json_config() {
    let schema = Schema::from_json(SCHEMA_JSON).unwrap();
    let config = CatalogConfig::from_json(
        r#"{ "canonicalizeAllSnowflakes": true, "memberReaders": { "warm": "cached" } }"#,
    )
    .unwrap();
    let catalog = Catalog::load(&schema, &config).unwrap();
    assert!(catalog.warnings().is_empty(), "{:?}", catalog.warnings());

    assert_eq!(
        catalog.member_reader("Inventory", "Product"),
        Some(MemberReaderKind::Cached)
    );

    // Declared class-first; canonical form joins product to the fact table.
    let shared = catalog.star_for_cube("Inventory").unwrap();
    let star = lock_star(&shared);
    let product = star.find_table("product").unwrap();
    assert_eq!(product.parent().map(|t| t.alias()), Some("inventory"));
    assert_eq!(
        product.join().unwrap().condition,
        rolap_star::JoinCondition::new(
            Expression::column("inventory", "product_id"),
            Expression::column("product", "product_id"),
        )
    );
    assert_eq!(
        star.find_table("product_class")
            .and_then(|t| t.parent())
            .map(|t| t.alias()),
        Some("product")
    );
    let units = catalog.measure_column("Inventory", "Units Shipped").unwrap();
    assert_eq!(
        star.column(units).expression(),
        &Expression::column("inventory", "units_shipped")
    );
}
