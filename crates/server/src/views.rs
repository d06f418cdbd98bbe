//! Engine values to wire DTOs.

use api_types::{
    NamedRef, PageView, UserSummary,
    budget::{BudgetPeriod as ApiPeriod, BudgetStatus as ApiBudgetStatus, BudgetView},
    expense::{ExpenseBudget, ExpenseStatus as ApiExpenseStatus, ExpenseView},
    notification::{NotificationKind as ApiKind, NotificationView},
};

pub(crate) fn map_expense_status(status: engine::ExpenseStatus) -> ApiExpenseStatus {
    match status {
        engine::ExpenseStatus::Pending => ApiExpenseStatus::Pending,
        engine::ExpenseStatus::Approved => ApiExpenseStatus::Approved,
        engine::ExpenseStatus::Rejected => ApiExpenseStatus::Rejected,
    }
}

pub(crate) fn parse_expense_status(status: ApiExpenseStatus) -> engine::ExpenseStatus {
    match status {
        ApiExpenseStatus::Pending => engine::ExpenseStatus::Pending,
        ApiExpenseStatus::Approved => engine::ExpenseStatus::Approved,
        ApiExpenseStatus::Rejected => engine::ExpenseStatus::Rejected,
    }
}

pub(crate) fn map_period(period: engine::BudgetPeriod) -> ApiPeriod {
    match period {
        engine::BudgetPeriod::Monthly => ApiPeriod::Monthly,
        engine::BudgetPeriod::Quarterly => ApiPeriod::Quarterly,
        engine::BudgetPeriod::Yearly => ApiPeriod::Yearly,
    }
}

pub(crate) fn parse_period(period: ApiPeriod) -> engine::BudgetPeriod {
    match period {
        ApiPeriod::Monthly => engine::BudgetPeriod::Monthly,
        ApiPeriod::Quarterly => engine::BudgetPeriod::Quarterly,
        ApiPeriod::Yearly => engine::BudgetPeriod::Yearly,
    }
}

pub(crate) fn map_budget_status(status: engine::BudgetStatus) -> ApiBudgetStatus {
    match status {
        engine::BudgetStatus::Active => ApiBudgetStatus::Active,
        engine::BudgetStatus::Archived => ApiBudgetStatus::Archived,
    }
}

pub(crate) fn parse_budget_status(status: ApiBudgetStatus) -> engine::BudgetStatus {
    match status {
        ApiBudgetStatus::Active => engine::BudgetStatus::Active,
        ApiBudgetStatus::Archived => engine::BudgetStatus::Archived,
    }
}

fn map_kind(kind: engine::NotificationKind) -> ApiKind {
    match kind {
        engine::NotificationKind::Info => ApiKind::Info,
        engine::NotificationKind::Warning => ApiKind::Warning,
        engine::NotificationKind::Action => ApiKind::Action,
    }
}

fn user_summary(user: engine::UserRef) -> UserSummary {
    UserSummary {
        id: user.id,
        name: user.name,
        email: user.email,
    }
}

fn named(named: engine::NamedRef) -> NamedRef {
    NamedRef {
        id: named.id,
        name: named.name,
    }
}

pub(crate) fn expense_view(detail: engine::ExpenseDetail) -> ExpenseView {
    let expense = detail.expense;
    ExpenseView {
        id: expense.id,
        budget_id: expense.budget_id,
        amount_minor: expense.amount.minor(),
        description: expense.description,
        receipt_url: expense.receipt_url,
        status: map_expense_status(expense.status),
        budget: detail.budget.map(|b| ExpenseBudget {
            id: b.id,
            name: b.name,
            department_id: b.department_id,
            category_id: b.category_id,
        }),
        user: detail.user.map(user_summary),
        approved_by: detail.approver.map(user_summary),
        approved_at: expense.approved_at,
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

pub(crate) fn budget_view(detail: engine::BudgetDetail) -> BudgetView {
    let budget = detail.budget;
    BudgetView {
        id: budget.id,
        name: budget.name,
        amount_minor: budget.amount.minor(),
        spent_minor: budget.spent.minor(),
        remaining_minor: detail.remaining.minor(),
        period: map_period(budget.period),
        start_date: budget.start_date,
        end_date: budget.end_date,
        status: map_budget_status(budget.status),
        department: detail.department.map(named),
        category: detail.category.map(named),
        owner: detail.owner.map(user_summary),
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

pub(crate) fn notification_view(notification: engine::Notification) -> NotificationView {
    NotificationView {
        id: notification.id,
        title: notification.title,
        message: notification.message,
        kind: map_kind(notification.kind),
        read: notification.read,
        created_at: notification.created_at,
    }
}

pub(crate) fn page_view<T, U>(page: engine::Page<T>, f: impl FnMut(T) -> U) -> PageView<U> {
    PageView {
        data: page.data.into_iter().map(f).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
        has_next_page: page.has_next_page,
        has_prev_page: page.has_prev_page,
    }
}
