use crate::args::SampleArgs;
use crate::commands::Out;
use crate::model::Rows;
use crate::{sample, Result};
use chrono::Local;

/// Writes `args.count()` generated expenditures to `args.out()`, dated backwards from today.
///
/// # Errors
/// - Returns an error if the output extension is not `.json` or `.csv`, or the write fails.
pub async fn sample(args: SampleArgs) -> Result<Out<usize>> {
    let today = Local::now().date_naive();
    let rows = Rows::new(sample::expenses(args.count(), today));
    rows.save(args.out()).await?;
    let count = rows.len();
    let message = format!(
        "Wrote {} sample row{} to {}",
        count,
        if count == 1 { "" } else { "s" },
        args.out().display()
    );
    Ok(Out::new(message, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sample_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.json");
        let out = sample(SampleArgs::new(12, &path)).await.unwrap();
        assert_eq!(out.structure(), Some(&12));
        assert_eq!(Rows::load(&path).await.unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_sample_bad_extension() {
        let dir = TempDir::new().unwrap();
        let result = sample(SampleArgs::new(3, dir.path().join("rows.xml"))).await;
        assert!(result.is_err());
    }
}
