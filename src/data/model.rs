use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// Month – canonical calendar order for grouping and charts
// ---------------------------------------------------------------------------

/// Calendar month with a fixed Jan→Dec total order.
///
/// Monthly aggregates are keyed by this enum so they always come out in
/// calendar order, never alphabetical ("Apr, Aug, Dec, …") or first-seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Month of the given date. `month0()` is always in `0..12`.
    pub fn from_date(date: NaiveDate) -> Month {
        Month::ALL[date.month0() as usize % 12]
    }

    /// 1-based month number (Jan = 1 … Dec = 12).
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    /// Three-letter abbreviation ("Jan", "Feb", …).
    pub fn abbrev(self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    /// Calendar quarter (1–4) this month belongs to.
    pub fn quarter(self) -> u8 {
        (self as u8) / 3 + 1
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

// ---------------------------------------------------------------------------
// SalesRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single sales transaction (one row of the source table) together with the
/// derived columns every downstream aggregate depends on.
///
/// The derived fields are computed once in [`SalesRecord::new`] and are never
/// updated independently of the raw fields.
#[derive(Debug, Clone)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product_category: String,
    pub state: String,
    pub payment_method: String,
    pub total_sales_inr: f64,
    pub review_rating: f64,
    pub delivery_status: String,

    /// Calendar month of `date`.
    pub month: Month,
    /// Calendar quarter of `date` (1–4).
    pub quarter: u8,
    /// 1 iff `delivery_status == "Delivered"`.
    pub delivered_flag: u8,
    /// 1 iff `review_rating >= 4`.
    pub satisfied: u8,
    /// `ln(total_sales_inr + 1)`; the `+ 1` keeps zero-value sales defined.
    pub log_total_sales: f64,
}

impl SalesRecord {
    /// Build a record and its derived columns in one pass.
    ///
    /// No validation: out-of-range ratings or unknown delivery statuses are
    /// accepted as-is and simply yield `0` flags.
    pub fn new(
        date: NaiveDate,
        product_category: String,
        state: String,
        payment_method: String,
        total_sales_inr: f64,
        review_rating: f64,
        delivery_status: String,
    ) -> Self {
        let month = Month::from_date(date);
        let delivered_flag = u8::from(delivery_status == "Delivered");
        let satisfied = u8::from(review_rating >= 4.0);
        let log_total_sales = (total_sales_inr + 1.0).ln();

        SalesRecord {
            date,
            product_category,
            state,
            payment_method,
            total_sales_inr,
            review_rating,
            delivery_status,
            quarter: month.quarter(),
            month,
            delivered_flag,
            satisfied,
            log_total_sales,
        }
    }
}

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full enriched dataset with pre-computed distinct-value indexes for the
/// three filterable dimensions. Read-only after construction; the app shares
/// it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SalesDataset {
    /// All records in input order.
    pub records: Vec<SalesRecord>,
    /// Sorted distinct product categories.
    pub categories: BTreeSet<String>,
    /// Sorted distinct states.
    pub states: BTreeSet<String>,
    /// Sorted distinct payment methods.
    pub payment_methods: BTreeSet<String>,
}

impl SalesDataset {
    /// Build the distinct-value indexes from the loaded records.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let mut categories = BTreeSet::new();
        let mut states = BTreeSet::new();
        let mut payment_methods = BTreeSet::new();

        for r in &records {
            categories.insert(r.product_category.clone());
            states.insert(r.state.clone());
            payment_methods.insert(r.payment_method.clone());
        }

        SalesDataset {
            records,
            categories,
            states,
            payment_methods,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
