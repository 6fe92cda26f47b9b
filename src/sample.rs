//! Generates deterministic sample expenditures for trying the table without real data.

use crate::model::{Amount, Row};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

const CATEGORIES: [&str; 5] = ["Food", "Transport", "Groceries", "Bills", "Entertainment"];
const METHODS: [&str; 4] = ["Cash", "Card", "UPI", "Transfer"];
const ROWS_PER_GROUP: usize = 10;
const MAX_NOTES_LEN: usize = 80;

const WORDS: [&str; 16] = [
    "weekly", "coffee", "market", "fuel", "lunch", "rent", "movie", "taxi", "internet", "gym",
    "books", "dinner", "snacks", "parking", "utilities", "concert",
];

/// Produces `count` rows dated backwards from `today`, one day apart.
///
/// Row `i` (1-based) has id `i`, an amount of `(i % 50) + 10` plus 50 cents for every third
/// row, and a category and payment method picked by its group of ten.
pub fn expenses(count: usize, today: NaiveDate) -> Vec<Row> {
    (1..=count).map(|i| expense(i, today)).collect()
}

fn expense(i: usize, today: NaiveDate) -> Row {
    let idx = i - 1;
    let group = i.div_ceil(ROWS_PER_GROUP);
    let date = today
        .checked_sub_days(Days::new(i as u64))
        .unwrap_or(NaiveDate::MIN);
    let dollars = Decimal::from((i % 50) as u64 + 10);
    let cents = Decimal::new(50 * (idx % 3) as i64, 2);

    Row::new(i as i64, description(i), Amount::new(dollars + cents))
        .with_date(date.format("%Y-%m-%d").to_string())
        .with_category(CATEGORIES[group % CATEGORIES.len()])
        .with_method(METHODS[group % METHODS.len()])
        .with_notes(notes(i))
}

fn word(n: usize) -> &'static str {
    WORDS[n % WORDS.len()]
}

fn description(i: usize) -> String {
    format!("{} {} {}", word(i), word(i * 7 + 3), word(i * 13 + 5))
}

fn notes(i: usize) -> String {
    let sentence: String = (0..12)
        .map(|n| word(i * 5 + n * 3))
        .collect::<Vec<_>>()
        .join(" ");
    sentence.chars().take(MAX_NOTES_LEN).collect()
}
