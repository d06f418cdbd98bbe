use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of every HTTP response.
///
/// `data` is present on success, `message` on errors and on replayed
/// approval decisions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// One page of a list endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageView<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum ExpenseStatus {
        Pending,
        Approved,
        Rejected,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub budget_id: Uuid,
        /// Must be > 0.
        pub amount_minor: i64,
        pub description: String,
        pub receipt_url: Option<String>,
    }

    /// Partial edit of a pending expense; absent fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub amount_minor: Option<i64>,
        pub description: Option<String>,
        pub receipt_url: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseListQuery {
        pub page: Option<u64>,
        pub limit: Option<u64>,
        pub budget_id: Option<Uuid>,
        pub user_id: Option<Uuid>,
        pub status: Option<ExpenseStatus>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RejectBody {
        pub reason: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseBudget {
        pub id: Uuid,
        pub name: String,
        pub department_id: Uuid,
        pub category_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub budget_id: Uuid,
        pub amount_minor: i64,
        pub description: String,
        pub receipt_url: Option<String>,
        pub status: ExpenseStatus,
        /// `None` only when the referenced budget no longer exists.
        pub budget: Option<ExpenseBudget>,
        pub user: Option<UserSummary>,
        pub approved_by: Option<UserSummary>,
        pub approved_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum BudgetPeriod {
        Monthly,
        Quarterly,
        Yearly,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum BudgetStatus {
        Active,
        Archived,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub name: String,
        /// Required for ADMINs; ignored for MANAGERs.
        pub department_id: Option<Uuid>,
        pub category_id: Uuid,
        pub owner_id: Option<Uuid>,
        pub amount_minor: i64,
        pub period: BudgetPeriod,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub name: Option<String>,
        /// Cannot go below the budget's current spend.
        pub amount_minor: Option<i64>,
        pub period: Option<BudgetPeriod>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetListQuery {
        pub page: Option<u64>,
        pub limit: Option<u64>,
        pub department_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub status: Option<BudgetStatus>,
        /// Case-insensitive match on the budget name.
        pub search: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub name: String,
        pub amount_minor: i64,
        pub spent_minor: i64,
        pub remaining_minor: i64,
        pub period: BudgetPeriod,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub status: BudgetStatus,
        pub department: Option<NamedRef>,
        pub category: Option<NamedRef>,
        pub owner: Option<UserSummary>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod notification {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum NotificationKind {
        Info,
        Warning,
        Action,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct NotificationListQuery {
        pub page: Option<u64>,
        pub limit: Option<u64>,
        pub read: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: Uuid,
        pub title: String,
        pub message: String,
        #[serde(rename = "type")]
        pub kind: NotificationKind,
        pub read: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnreadCount {
        pub unread_count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MarkedRead {
        pub updated: u64,
    }
}
