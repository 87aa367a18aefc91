//! Summary aggregation: per-product and store-wide sales statistics.
//!
//! Computed on demand from persisted stock records and orders. All lookup
//! tables are local to one call.

use std::collections::HashMap;

use serde::Serialize;

use siftledger_core::{DomainError, DomainResult, ProductId};
use siftledger_inventory::StockRecord;
use siftledger_orders::{LineStatus, Order};

/// Statistics for one stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub product_name: String,
    pub in_stock: u64,
    pub sold: u64,
    pub sifting: u64,
    /// `in_stock + sold + sifting`: the stock level before any order, plus restocks.
    pub total: u64,
    pub cost_price: u64,
    pub selling_price: u64,
    /// `cost_price * total`.
    pub total_cost: u64,
    pub sales_value: u64,
    pub sifting_value: u64,
    /// Realized on sold units only: `sales_value - cost_price * sold`.
    pub profit: i64,
}

/// Store-wide totals plus the per-product breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    pub products: Vec<ProductSummary>,
    pub total_in_stock: u64,
    pub total_sold: u64,
    pub total_sifting: u64,
    pub total_cost: u64,
    pub total_sales_value: u64,
    pub total_sifting_value: u64,
    pub total_profit: i64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    sold: u64,
    sifting: u64,
    sales_value: u64,
    sifting_value: u64,
}

fn overflow(field: &'static str) -> DomainError {
    DomainError::validation(field, "summary figure overflows")
}

fn add(field: &'static str, a: u64, b: u64) -> DomainResult<u64> {
    a.checked_add(b).ok_or_else(|| overflow(field))
}

fn mul(field: &'static str, a: u64, b: u64) -> DomainResult<u64> {
    a.checked_mul(b).ok_or_else(|| overflow(field))
}

fn signed(field: &'static str, v: u64) -> DomainResult<i64> {
    i64::try_from(v).map_err(|_| overflow(field))
}

/// Build the summary for one seller's records and orders.
///
/// Every line item is visited exactly once. A seller without stock records gets
/// the zeroed report. A figure that does not fit its type is a validation error
/// naming the field.
pub fn summarize(records: &[StockRecord], orders: &[Order]) -> DomainResult<SummaryReport> {
    let mut tallies: HashMap<ProductId, Tally> = HashMap::new();

    for item in orders.iter().flat_map(|o| o.items()) {
        let tally = tallies.entry(item.product_id()).or_default();
        match item.status() {
            LineStatus::Sifted => {
                tally.sold = add("sold", tally.sold, item.quantity())?;
                tally.sales_value = add("sales_value", tally.sales_value, item.total_price())?;
            }
            LineStatus::Sifting => {
                tally.sifting = add("sifting", tally.sifting, item.quantity())?;
                tally.sifting_value = add("sifting_value", tally.sifting_value, item.total_price())?;
            }
        }
    }

    let mut report = SummaryReport::default();

    for record in records {
        let tally = tallies
            .get(&record.id_typed())
            .copied()
            .unwrap_or_default();

        let in_stock = record.quantity_on_hand();
        let total = add("total", add("total", in_stock, tally.sold)?, tally.sifting)?;
        let total_cost = mul("total_cost", record.cost_price(), total)?;
        let sold_cost = mul("profit", record.cost_price(), tally.sold)?;
        let profit = signed("profit", tally.sales_value)?
            .checked_sub(signed("profit", sold_cost)?)
            .ok_or_else(|| overflow("profit"))?;

        report.total_in_stock = add("total_in_stock", report.total_in_stock, in_stock)?;
        report.total_sold = add("total_sold", report.total_sold, tally.sold)?;
        report.total_sifting = add("total_sifting", report.total_sifting, tally.sifting)?;
        report.total_cost = add("total_cost", report.total_cost, total_cost)?;
        report.total_sales_value =
            add("total_sales_value", report.total_sales_value, tally.sales_value)?;
        report.total_sifting_value = add(
            "total_sifting_value",
            report.total_sifting_value,
            tally.sifting_value,
        )?;
        report.total_profit = report
            .total_profit
            .checked_add(profit)
            .ok_or_else(|| overflow("total_profit"))?;

        report.products.push(ProductSummary {
            product_id: record.id_typed(),
            product_name: record.name().to_string(),
            in_stock,
            sold: tally.sold,
            sifting: tally.sifting,
            total,
            cost_price: record.cost_price(),
            selling_price: record.selling_price(),
            total_cost,
            sales_value: tally.sales_value,
            sifting_value: tally.sifting_value,
            profit,
        });
    }

    Ok(report)
}
