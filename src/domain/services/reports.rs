use std::collections::HashMap;
use serde::Serialize;
use crate::domain::models::{
    user::User,
    work_order::{WorkOrder, WorkOrderStatus},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuantity {
    pub product_name: String,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorReport {
    pub operator_name: String,
    pub report: Vec<ProductQuantity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductStatusSummary {
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(rename = "PENDING")]
    pub pending: i64,
    #[serde(rename = "IN_PROGRESS")]
    pub in_progress: i64,
    #[serde(rename = "COMPLETED")]
    pub completed: i64,
    #[serde(rename = "CANCELED")]
    pub canceled: i64,
    #[serde(rename = "totalQuantity")]
    pub total_quantity: i64,
}

impl ProductStatusSummary {
    fn empty(product_name: &str) -> Self {
        Self {
            product_name: product_name.to_string(),
            pending: 0,
            in_progress: 0,
            completed: 0,
            canceled: 0,
            total_quantity: 0,
        }
    }

    fn add(&mut self, status: WorkOrderStatus, quantity: i64) {
        let bucket = match status {
            WorkOrderStatus::Pending => &mut self.pending,
            WorkOrderStatus::InProgress => &mut self.in_progress,
            WorkOrderStatus::Completed => &mut self.completed,
            WorkOrderStatus::Canceled => &mut self.canceled,
        };
        *bucket += quantity;
        self.total_quantity += quantity;
    }
}

/// Completed quantity per product for every operator, in the order the
/// operators are given. Products keep the order in which they first appear.
pub fn operator_summary(operators: &[User], orders: &[WorkOrder]) -> Vec<OperatorReport> {
    operators
        .iter()
        .map(|operator| {
            let completed = orders.iter().filter(|o| {
                o.assigned_to_id == Some(operator.id) && o.status == WorkOrderStatus::Completed
            });
            OperatorReport {
                operator_name: operator.username.clone(),
                report: quantity_by_product(completed)
                    .into_iter()
                    .map(|(product_name, total_quantity)| ProductQuantity { product_name, total_quantity })
                    .collect(),
            }
        })
        .collect()
}

/// Quantity per status for every product across all orders, regardless of assignee.
pub fn product_summary(orders: &[WorkOrder]) -> Vec<ProductStatusSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<ProductStatusSummary> = Vec::new();

    for order in orders {
        let slot = *index.entry(order.product_name.as_str()).or_insert_with(|| {
            summaries.push(ProductStatusSummary::empty(&order.product_name));
            summaries.len() - 1
        });
        summaries[slot].add(order.status, order.quantity);
    }

    summaries
}

fn quantity_by_product<'a>(orders: impl Iterator<Item = &'a WorkOrder>) -> Vec<(String, i64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(String, i64)> = Vec::new();

    for order in orders {
        let slot = *index.entry(order.product_name.as_str()).or_insert_with(|| {
            totals.push((order.product_name.clone(), 0));
            totals.len() - 1
        });
        totals[slot].1 += order.quantity;
    }

    totals
}
