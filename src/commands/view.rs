use crate::args::ViewArgs;
use crate::commands::Out;
use crate::model::Rows;
use crate::render::{render, Rendered};
use crate::table::{Sort, SortDirection, Table};
use crate::{Config, Result};
use anyhow::Context;
use tracing::debug;

/// Loads the rows, applies the search, sort and page from `args` to a `Table`, and renders the
/// resulting page.
///
/// The rows file is `args.rows()` if given, otherwise the `rows_path` from `config.json`. The page
/// size falls back to the configured one as well.
///
/// # Errors
/// - Returns an error if no rows file is known, or if it cannot be read or parsed.
pub async fn view(config: Config, args: ViewArgs) -> Result<Out<Rendered>> {
    let path = match args.rows() {
        Some(p) => p.to_path_buf(),
        None => config
            .rows_path()
            .context("No rows file given, pass --rows or set rows_path in config.json")?,
    };
    let rows = Rows::load(&path).await?;

    let page_size = args.page_size().unwrap_or(config.page_size());
    let mut table = Table::with_options(
        rows.into_vec(),
        args.columns().columns(),
        page_size,
        config.sort_cycle(),
    );
    if let Some(filter) = args.filter() {
        table.set_filter_text(filter);
    }
    if let Some(key) = args.sort() {
        let direction = if args.desc() {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        table.set_sort(Some(Sort::new(key, direction)));
        if table.state().sort().is_none() {
            debug!("Column '{key}' is not sortable with the selected columns");
        }
    }
    table.set_page_index(args.page().saturating_sub(1));

    let view = table.view();
    let message = format!(
        "Showing {} of {} matching row{} (page {} of {})",
        view.rows().len(),
        view.filtered_count(),
        if view.filtered_count() == 1 { "" } else { "s" },
        view.page_index() + 1,
        view.page_count()
    );
    let rendered = render(&view, table.columns(), table.state(), args.format())?;
    Ok(Out::new(message, rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ColumnSet;
    use crate::model::ColumnKey;
    use crate::render::OutputFormat;
    use crate::test::{coffee_rows, TestEnv};

    async fn write_rows(env: &TestEnv, name: &str) -> std::path::PathBuf {
        let path = env.dir().join(name);
        Rows::new(coffee_rows()).save(&path).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_view_filter_and_sort() {
        let env = TestEnv::new().await;
        let path = write_rows(&env, "rows.json").await;
        let args = ViewArgs::new(Some(path))
            .with_filter("COFFEE")
            .with_sort(ColumnKey::Amount, true);
        let out = view(env.config(), args).await.unwrap();
        assert_eq!(out.message(), "Showing 2 of 2 matching rows (page 1 of 1)");
        let text = out.structure().unwrap().to_string();
        assert!(text.contains("Amount ▼"));
        let beans = text.find("coffee beans").unwrap();
        let coffee = text.find("| Coffee |").unwrap();
        assert!(beans < coffee);
        assert!(text.contains("Total (all): $16.50"));
    }

    #[tokio::test]
    async fn test_view_page_past_end_is_clamped() {
        let env = TestEnv::new().await;
        let path = write_rows(&env, "rows.csv").await;
        let args = ViewArgs::new(Some(path)).with_page_size(2).with_page(9);
        let out = view(env.config(), args).await.unwrap();
        assert_eq!(out.message(), "Showing 1 of 3 matching rows (page 2 of 2)");
    }

    #[tokio::test]
    async fn test_view_uses_configured_rows_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let home = dir.path().join("home");
        let config = Config::create(&home, Some(std::path::Path::new("rows.json")))
            .await
            .unwrap();
        Rows::new(coffee_rows())
            .save(&config.root().join("rows.json"))
            .await
            .unwrap();
        let args = ViewArgs::new(None)
            .with_columns(ColumnSet::Expenditure)
            .with_format(OutputFormat::Csv);
        let out = view(config, args).await.unwrap();
        let text = out.structure().unwrap().to_string();
        assert!(text.starts_with("Date,Description,Amount ($),Category,Payment Method,Notes"));
        assert!(text.contains("1kg bag"));
    }

    #[tokio::test]
    async fn test_view_without_rows_file() {
        let env = TestEnv::new().await;
        let result = view(env.config(), ViewArgs::new(None)).await;
        assert!(result.is_err());
    }
}
