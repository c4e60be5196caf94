//! Resolver tests against a live MySQL server
//!
//! Covers primary key detection, structure and schema dumps, column limits and
//! the connection options a session is opened with.

#[cfg(test)]
mod tests {
    use crate::fixtures::{DB_TYPES, FixtureSchema, MEMOS, STANDARD_TABLES};
    use anyhow::{Context, Result};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schemalens_core::{SchemaLensError, SemanticType};
    use schemalens_drivers::{BlockingResolver, DriverRegistry, block_on_tokio};

    /// Lines of a schema dump declaring a column of one of the given types
    fn typed_lines<'a>(dump: &'a str, types: &[&str]) -> Vec<&'a str> {
        dump.lines()
            .filter(|line| {
                let line = line.trim_start();
                types
                    .iter()
                    .any(|t| line.starts_with(&format!("t.{} ", t)))
            })
            .collect()
    }

    /// Split a structure dump into its statements
    fn statements(dump: &str) -> Vec<&str> {
        dump.split("\n\n")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Table a `CREATE TABLE` statement creates
    fn created_table(statement: &str) -> Option<&str> {
        let rest = statement.strip_prefix("CREATE TABLE `")?;
        rest.split('`').next()
    }

    /// Run every statement of a structure dump, in dump order, against `target`
    async fn replay(dump: &str, target: &mut FixtureSchema) -> Result<()> {
        for statement in statements(dump) {
            let table = created_table(statement)
                .with_context(|| format!("not a CREATE TABLE statement:\n{}", statement))?;
            target
                .create_table(table, statement)
                .await
                .with_context(|| format!("replaying dump statement:\n{}", statement))?;
        }
        Ok(())
    }

    #[rstest]
    #[case::default_id("books", Some("id"))]
    #[case::custom_key("cars", Some("legacy_id"))]
    #[case::no_key("cats", None)]
    #[tokio::test]
    async fn test_primary_key(#[case] table: &str, #[case] expected: Option<&str>) -> Result<()> {
        let schema = FixtureSchema::setup().await?;

        let primary_key = schema.resolver().primary_key(table).await?;
        assert_eq!(primary_key.as_deref(), expected);

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_composite_primary_key() -> Result<()> {
        let mut schema = FixtureSchema::empty().await?;
        schema
            .create_table(
                "memberships",
                "CREATE TABLE `memberships` (
                    `group_id` int NOT NULL,
                    `user_id` int NOT NULL,
                    PRIMARY KEY (`group_id`, `user_id`)
                )",
            )
            .await?;

        let resolver = schema.resolver();
        assert_eq!(resolver.primary_key("memberships").await?, None);
        assert_eq!(
            resolver.primary_key_columns("memberships").await?,
            vec!["group_id".to_string(), "user_id".to_string()]
        );

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_structure_dump_includes_every_table() -> Result<()> {
        let schema = FixtureSchema::setup().await?;

        let dump = schema.resolver().structure_dump(None).await?;
        for table in ["books", "cars", "cats", "memos"] {
            assert!(
                dump.contains(&format!("CREATE TABLE `{}`", table)),
                "missing {} in:\n{}",
                table,
                dump
            );
        }

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_structure_dump_round_trips() -> Result<()> {
        let mut tables = STANDARD_TABLES.to_vec();
        tables.push(DB_TYPES);
        let source = FixtureSchema::with_tables(&tables).await?;
        let dump = source.resolver().structure_dump(None).await?;

        let mut target = FixtureSchema::empty().await?;
        replay(&dump, &mut target).await?;

        assert_eq!(target.resolver().tables().await?, source.resolver().tables().await?);
        for table in source.resolver().tables().await? {
            assert_eq!(
                target.resolver().columns(&table).await?,
                source.resolver().columns(&table).await?,
                "columns of {} differ after replay",
                table
            );
        }

        target.teardown().await?;
        source.teardown().await
    }

    #[tokio::test]
    async fn test_structure_dump_replays_foreign_keys() -> Result<()> {
        let mut source = FixtureSchema::empty().await?;
        source
            .create_table(
                "teams",
                "CREATE TABLE `teams` (`id` int NOT NULL AUTO_INCREMENT, `slug` varchar(40) NOT NULL,
                    PRIMARY KEY (`id`), UNIQUE KEY `index_teams_on_slug` (`slug`)) ENGINE=InnoDB",
            )
            .await?;
        source
            .create_table(
                "players",
                "CREATE TABLE `players` (`id` int NOT NULL AUTO_INCREMENT, `team_id` int NOT NULL,
                    PRIMARY KEY (`id`),
                    CONSTRAINT `fk_players_team` FOREIGN KEY (`team_id`) REFERENCES `teams` (`id`)) ENGINE=InnoDB",
            )
            .await?;

        let dump = source.resolver().structure_dump(None).await?;
        let order: Vec<&str> = statements(&dump).into_iter().filter_map(created_table).collect();
        assert_eq!(order, vec!["teams", "players"]);

        let mut target = FixtureSchema::empty().await?;
        replay(&dump, &mut target).await?;

        assert_eq!(target.resolver().structure_dump(None).await?, dump);
        assert_eq!(
            target.resolver().table("players").await?,
            source.resolver().table("players").await?
        );

        target.teardown().await?;
        source.teardown().await
    }

    #[tokio::test]
    async fn test_structure_dump_replays_generated_defaults() -> Result<()> {
        let mut source = FixtureSchema::empty().await?;
        source
            .create_table(
                "audits",
                "CREATE TABLE `audits` (
                    `id` int NOT NULL AUTO_INCREMENT,
                    `touched_at` timestamp(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6),
                    `token` varchar(36) NOT NULL DEFAULT (uuid()),
                    `state` varchar(20) NOT NULL DEFAULT 'new',
                    PRIMARY KEY (`id`)
                )",
            )
            .await?;

        let dump = source.resolver().structure_dump(None).await?;
        assert!(dump.contains("ON UPDATE CURRENT_TIMESTAMP"), "{}", dump);

        let mut target = FixtureSchema::empty().await?;
        replay(&dump, &mut target).await?;

        let table = target.resolver().table("audits").await?;
        let touched_at = table.column("touched_at").context("touched_at missing")?;
        assert_eq!(touched_at.sql_type, "timestamp");
        assert_eq!(touched_at.default.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert!(touched_at.default_is_expression);
        assert_eq!(touched_at.on_update.as_deref(), Some("CURRENT_TIMESTAMP"));

        let token = table.column("token").context("token missing")?;
        assert_eq!(token.default.as_deref(), Some("uuid()"));
        assert!(token.default_is_expression);

        let state = table.column("state").context("state missing")?;
        assert_eq!(state.default.as_deref(), Some("new"));
        assert!(!state.default_is_expression);

        target.teardown().await?;
        source.teardown().await
    }

    #[tokio::test]
    async fn test_schema_dump_prints_large_text_limit() -> Result<()> {
        let schema = FixtureSchema::setup().await?;

        let dump = schema.resolver().schema_dump(None).await?;
        let text_line = typed_lines(&dump, &["text"])
            .into_iter()
            .find(|line| line.contains("\"text\""))
            .context("memos.text missing from schema dump")?;
        assert!(
            text_line.ends_with(":limit => 2147483647"),
            "unexpected line: {}",
            text_line
        );

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_schema_dump_has_no_limit_on_dates() -> Result<()> {
        let schema = FixtureSchema::setup().await?;

        let dump = schema.resolver().schema_dump(None).await?;
        let dated = typed_lines(&dump, &["date", "datetime"]);
        assert_eq!(dated.len(), 3, "{}", dump);
        for line in dated {
            assert!(!line.contains(":limit"), "unexpected limit: {}", line);
        }

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_schema_dump_cars_and_cats_headers() -> Result<()> {
        let schema = FixtureSchema::setup().await?;

        let dump = schema.resolver().schema_dump(Some(&["cars", "cats"])).await?;
        assert!(dump.contains(r#"create_table "cars", :primary_key => "legacy_id", :force => true do |t|"#));
        assert!(dump.contains(r#"create_table "cats", :id => false, :force => true do |t|"#));

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_memo_text_column() -> Result<()> {
        let schema = FixtureSchema::with_tables(&[MEMOS]).await?;

        let columns = schema.resolver().columns("memos").await?;
        let text = columns
            .iter()
            .find(|c| c.name == "text")
            .context("text column missing")?;
        assert_eq!(text.limit, Some(2_147_483_647));
        assert!(
            text.sql_type.to_lowercase().starts_with("longtext"),
            "{}",
            text.sql_type
        );
        assert_eq!(text.semantic_type, SemanticType::Text);

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_url_carries_connection_options() -> Result<()> {
        let schema = FixtureSchema::empty().await?;

        let url = schema.resolver().url();
        assert!(url.contains("characterEncoding=utf8"), "{}", url);
        assert!(url.contains("useUnicode=true"), "{}", url);
        assert!(url.contains("zeroDateTimeBehavior=convertToNull"), "{}", url);
        assert!(url.contains(schema.database()), "{}", url);

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_no_limits_for_some_data_types() -> Result<()> {
        let schema = FixtureSchema::with_tables(&[DB_TYPES]).await?;

        let dump = schema.resolver().schema_dump(None).await?;
        let offending: Vec<&str> =
            typed_lines(&dump, &["float", "date", "datetime", "integer", "time", "timestamp"])
                .into_iter()
                .filter(|line| line.contains(":limit") && !line.contains("sample_integer"))
                .collect();
        assert!(offending.is_empty(), "{:?}\n{}", offending, dump);

        for decimal in typed_lines(&dump, &["decimal"]) {
            assert!(!decimal.contains(":limit"), "{}", decimal);
            assert!(decimal.contains(":precision"), "{}", decimal);
        }
        assert!(dump.contains(":default => -1"), "{}", dump);

        schema.teardown().await
    }

    #[rstest]
    #[case::bigint("sample_integer", Some(8))]
    #[case::smallint("sample_integer_with_limit_2", Some(2))]
    #[case::int("sample_integer_no_limit", Some(4))]
    #[case::boolean("sample_boolean", None)]
    #[case::timestamp("sample_timestamp", None)]
    #[case::text("sample_text", Some(65_535))]
    #[case::blob("sample_binary", Some(65_535))]
    #[tokio::test]
    async fn test_column_limits(#[case] column: &str, #[case] limit: Option<i64>) -> Result<()> {
        let schema = FixtureSchema::with_tables(&[DB_TYPES]).await?;

        let table = schema.resolver().table("db_types").await?;
        let descriptor = table.column(column).context("column missing")?;
        assert_eq!(descriptor.limit, limit, "{}", column);

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() -> Result<()> {
        let schema = FixtureSchema::setup().await?;
        let resolver = schema.resolver();

        assert!(resolver.columns("dogs").await.unwrap_err().is_not_found());
        assert!(resolver.primary_key("dogs").await.unwrap_err().is_not_found());
        assert!(
            resolver
                .structure_dump(Some(&["dogs"]))
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(!resolver.table_exists("dogs").await?);

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_unmapped_type_is_reported() -> Result<()> {
        let mut schema = FixtureSchema::empty().await?;
        schema
            .create_table(
                "places",
                "CREATE TABLE `places` (`id` int NOT NULL, `shape` geometry, PRIMARY KEY (`id`))",
            )
            .await?;

        match schema.resolver().columns("places").await {
            Err(SchemaLensError::UnsupportedType { native_type, .. }) => {
                assert_eq!(native_type, "geometry")
            }
            other => panic!("expected UnsupportedType, got {:?}", other),
        }

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_zero_date_default_converts_to_null() -> Result<()> {
        let mut schema = FixtureSchema::empty().await?;
        schema.execute("SET SESSION sql_mode = ''").await?;
        schema
            .create_table(
                "legacy_events",
                "CREATE TABLE `legacy_events` (
                    `happened_at` datetime NOT NULL DEFAULT '0000-00-00 00:00:00',
                    `label` varchar(20) NOT NULL DEFAULT 'none'
                )",
            )
            .await?;

        let columns = schema.resolver().columns("legacy_events").await?;
        assert_eq!(columns[0].default, None);
        assert_eq!(columns[1].default.as_deref(), Some("none"));

        schema.teardown().await
    }

    #[tokio::test]
    async fn test_unique_and_foreign_keys_in_structure_dump() -> Result<()> {
        let mut schema = FixtureSchema::empty().await?;
        schema
            .create_table(
                "teams",
                "CREATE TABLE `teams` (`id` int NOT NULL AUTO_INCREMENT, `slug` varchar(40) NOT NULL,
                    PRIMARY KEY (`id`), UNIQUE KEY `index_teams_on_slug` (`slug`)) ENGINE=InnoDB",
            )
            .await?;
        schema
            .create_table(
                "players",
                "CREATE TABLE `players` (`id` int NOT NULL AUTO_INCREMENT, `team_id` int NOT NULL,
                    PRIMARY KEY (`id`),
                    CONSTRAINT `fk_players_team` FOREIGN KEY (`team_id`) REFERENCES `teams` (`id`)) ENGINE=InnoDB",
            )
            .await?;

        let dump = schema
            .resolver()
            .structure_dump(Some(&["teams", "players"]))
            .await?;
        assert!(dump.contains("UNIQUE KEY `index_teams_on_slug` (`slug`)"), "{}", dump);
        assert!(
            dump.contains(
                "CONSTRAINT `fk_players_team` FOREIGN KEY (`team_id`) REFERENCES `teams` (`id`)"
            ),
            "{}",
            dump
        );

        schema.teardown().await
    }

    #[test]
    fn test_blocking_resolver_through_registry() -> Result<()> {
        let schema = block_on_tokio(FixtureSchema::setup())?;
        let registry = DriverRegistry::with_defaults();

        let mut config = schema.config().clone();
        config.driver = "mariadb".to_string();
        let resolver = BlockingResolver::connect(&registry, &config)?;

        assert_eq!(resolver.tables()?, vec!["books", "cars", "cats", "memos"]);
        assert_eq!(resolver.primary_key("cars")?.as_deref(), Some("legacy_id"));
        drop(resolver);

        block_on_tokio(schema.teardown())
    }
}
