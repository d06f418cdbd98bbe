use chrono::Utc;
use sea_orm::{
    Condition, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Actor, Budget, EngineError, Expense, ExpenseListFilter, ExpenseNew, ExpenseStatus,
    ExpenseUpdate, NotificationKind, NotificationNew, Page, Pagination, ResourceKind,
    ResultEngine, Role, Scope, budgets, expenses, expenses::ensure_positive, users,
};

use super::{
    Engine, ExpenseDetail,
    detail::{expense_detail, expense_details},
    normalize_optional_text, normalize_required_text, require_decider, with_tx,
};

impl Engine {
    /// Loads an expense and checks it against the actor's expense scope.
    ///
    /// Department scope is resolved through the expense's budget.
    pub(super) async fn scoped_expense<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &Actor,
        expense_id: Uuid,
    ) -> ResultEngine<expenses::Model> {
        let model = expenses::Entity::find_by_id(expense_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        let scope = Scope::for_actor(actor, ResourceKind::Expense);
        let budget_department = match scope {
            Scope::Department(_) | Scope::OwnerOrDepartment { .. } => {
                budgets::Entity::find_by_id(model.budget_id)
                    .one(db)
                    .await?
                    .map(|b| b.department_id)
            }
            _ => None,
        };
        if !scope.permits_expense(model.user_id, budget_department) {
            return Err(EngineError::Forbidden("access denied".to_string()));
        }
        Ok(model)
    }

    /// Creates a `PENDING` expense owned by `actor` and tells the approvers.
    pub async fn submit_expense(
        &self,
        actor: &Actor,
        cmd: ExpenseNew,
    ) -> ResultEngine<ExpenseDetail> {
        ensure_positive(cmd.amount)?;
        let description = normalize_required_text(&cmd.description, "description")?;
        let receipt_url = normalize_optional_text(cmd.receipt_url.as_deref());

        let (detail, budget) = with_tx!(self, |db_tx| {
            let model = self.scoped_budget(&db_tx, actor, cmd.budget_id).await?;
            let budget = Budget::try_from(model)?;
            if budget.is_archived() {
                return Err(EngineError::InvalidInput(
                    "cannot submit expenses to an archived budget".to_string(),
                ));
            }

            let expense = Expense::new(
                budget.id,
                actor.id,
                cmd.amount,
                description,
                receipt_url,
                Utc::now(),
            )?;
            let model = expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
            Ok::<_, EngineError>((expense_detail(&db_tx, model).await?, budget))
        })?;

        tracing::info!(
            expense_id = %detail.expense.id,
            budget_id = %budget.id,
            amount = %detail.expense.amount,
            "expense submitted"
        );
        self.notify_approvers(actor, &detail, &budget).await;
        Ok(detail)
    }

    async fn notify_approvers(&self, actor: &Actor, detail: &ExpenseDetail, budget: &Budget) {
        let approvers = match users::Entity::find()
            .filter(users::Column::Active.eq(true))
            .filter(users::Column::Id.ne(actor.id))
            .filter(
                Condition::any()
                    .add(users::Column::Role.eq(Role::Admin.as_str()))
                    .add(
                        Condition::all()
                            .add(users::Column::Role.eq(Role::Manager.as_str()))
                            .add(users::Column::DepartmentId.eq(budget.department_id)),
                    ),
            )
            .all(&self.database)
            .await
        {
            Ok(approvers) => approvers,
            Err(err) => {
                tracing::warn!(expense_id = %detail.expense.id, "cannot resolve approvers: {err}");
                return;
            }
        };

        let submitter = detail
            .user
            .as_ref()
            .map_or("A user", |user| user.name.as_str());
        for approver in approvers {
            self.emit(NotificationNew::new(
                approver.id,
                "Expense Awaiting Approval",
                format!(
                    "{submitter} submitted an expense of {} for \"{}\" that requires your approval.",
                    detail.expense.amount, detail.expense.description
                ),
                NotificationKind::Action,
            ))
            .await;
        }
    }

    pub async fn expense(&self, actor: &Actor, expense_id: Uuid) -> ResultEngine<ExpenseDetail> {
        let model = self
            .scoped_expense(&self.database, actor, expense_id)
            .await?;
        expense_detail(&self.database, model).await
    }

    /// Lists the expenses visible to `actor`, newest first.
    pub async fn list_expenses(
        &self,
        actor: &Actor,
        filter: &ExpenseListFilter,
        pagination: Pagination,
    ) -> ResultEngine<Page<ExpenseDetail>> {
        let scope = Scope::for_actor(actor, ResourceKind::Expense);
        let mut query = expenses::Entity::find().filter(scope.expense_condition());
        if let Some(budget_id) = filter.budget_id {
            query = query.filter(expenses::Column::BudgetId.eq(budget_id));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(expenses::Column::UserId.eq(user_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(expenses::Column::Status.eq(status.as_str()));
        }

        let total = query.clone().count(&self.database).await?;
        let models = query
            .order_by_desc(expenses::Column::CreatedAt)
            .offset(pagination.offset())
            .limit(pagination.limit)
            .all(&self.database)
            .await?;
        let details = expense_details(&self.database, models).await?;
        Ok(Page::new(details, total, pagination))
    }

    /// `PENDING` expenses the actor may decide on.
    pub async fn pending_approvals(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> ResultEngine<Page<ExpenseDetail>> {
        require_decider(actor, "view pending approvals")?;
        let filter = ExpenseListFilter {
            status: Some(ExpenseStatus::Pending),
            ..Default::default()
        };
        self.list_expenses(actor, &filter, pagination).await
    }

    /// Edits a pending expense.
    ///
    /// The write is conditional on `status = PENDING`: an edit that loses a
    /// race against a decision fails instead of changing a counted amount.
    pub async fn update_expense(
        &self,
        actor: &Actor,
        expense_id: Uuid,
        update: ExpenseUpdate,
    ) -> ResultEngine<ExpenseDetail> {
        if let Some(amount) = update.amount {
            ensure_positive(amount)?;
        }
        let description = update
            .description
            .as_deref()
            .map(|d| normalize_required_text(d, "description"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.scoped_expense(&db_tx, actor, expense_id).await?;
            Expense::try_from(model)?.ensure_editable()?;

            let mut query = expenses::Entity::update_many()
                .col_expr(expenses::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(expenses::Column::Id.eq(expense_id))
                .filter(expenses::Column::Status.eq(ExpenseStatus::Pending.as_str()));
            if let Some(amount) = update.amount {
                query = query.col_expr(expenses::Column::AmountMinor, Expr::value(amount.minor()));
            }
            if let Some(description) = description {
                query = query.col_expr(expenses::Column::Description, Expr::value(description));
            }
            if let Some(receipt_url) = update.receipt_url.as_deref() {
                query = query.col_expr(
                    expenses::Column::ReceiptUrl,
                    Expr::value(normalize_optional_text(Some(receipt_url))),
                );
            }
            if query.exec(&db_tx).await?.rows_affected == 0 {
                return Err(EngineError::InvalidState(
                    "cannot edit approved or rejected expenses".to_string(),
                ));
            }

            let model = expenses::Entity::find_by_id(expense_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
            expense_detail(&db_tx, model).await
        })
    }
}

