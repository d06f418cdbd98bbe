use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    Actor, Budget, BudgetListFilter, BudgetNew, BudgetStatus, BudgetUpdate, EngineError,
    NotificationKind, NotificationNew, Page, Pagination, ResourceKind, ResultEngine, Role, Scope,
    budgets, categories, departments, users,
};

use super::{
    BudgetDetail, Engine,
    detail::{budget_detail, budget_details},
    normalize_required_text, require_decider, with_tx,
};

impl Engine {
    /// Loads a budget and checks it against the actor's budget scope.
    ///
    /// Missing budgets are `KeyNotFound`; existing budgets outside the scope
    /// are `Forbidden`.
    pub(super) async fn scoped_budget<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &Actor,
        budget_id: Uuid,
    ) -> ResultEngine<budgets::Model> {
        let model = budgets::Entity::find_by_id(budget_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))?;
        let scope = Scope::for_actor(actor, ResourceKind::Budget);
        if !scope.permits_budget(model.owner_id, model.department_id) {
            return Err(EngineError::Forbidden("access denied".to_string()));
        }
        Ok(model)
    }

    /// Budgets are administered by ADMINs and by MANAGERs of their own
    /// department.
    async fn managed_budget(
        &self,
        db_tx: &DatabaseTransaction,
        actor: &Actor,
        budget_id: Uuid,
    ) -> ResultEngine<Budget> {
        require_decider(actor, "manage budgets")?;
        let model = self.scoped_budget(db_tx, actor, budget_id).await?;
        if actor.role == Role::Manager && actor.department_id != Some(model.department_id) {
            return Err(EngineError::Forbidden("access denied".to_string()));
        }
        Budget::try_from(model)
    }

    pub async fn create_budget(&self, actor: &Actor, cmd: BudgetNew) -> ResultEngine<BudgetDetail> {
        require_decider(actor, "create budgets")?;
        let department_id = match actor.role {
            Role::Manager => actor.department_id.ok_or_else(|| {
                EngineError::Forbidden("department assignment required".to_string())
            })?,
            _ => cmd.department_id.ok_or_else(|| {
                EngineError::InvalidInput("department_id is required".to_string())
            })?,
        };
        let name = normalize_required_text(&cmd.name, "budget name")?;
        if cmd.amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "budget amount must be >= 0".to_string(),
            ));
        }
        if cmd.end_date < cmd.start_date {
            return Err(EngineError::InvalidInput(
                "end_date must not be before start_date".to_string(),
            ));
        }
        let owner_id = cmd.owner_id.unwrap_or(actor.id);

        let detail = with_tx!(self, |db_tx| {
            if departments::Entity::find_by_id(department_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("department not exists".to_string()));
            }
            if categories::Entity::find_by_id(cmd.category_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("category not exists".to_string()));
            }
            if users::Entity::find_by_id(owner_id).one(&db_tx).await?.is_none() {
                return Err(EngineError::KeyNotFound("owner not exists".to_string()));
            }

            let now = Utc::now();
            let model = budgets::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                name: ActiveValue::Set(name),
                department_id: ActiveValue::Set(department_id),
                category_id: ActiveValue::Set(cmd.category_id),
                owner_id: ActiveValue::Set(owner_id),
                amount_minor: ActiveValue::Set(cmd.amount.minor()),
                spent_minor: ActiveValue::Set(0),
                period: ActiveValue::Set(cmd.period.as_str().to_string()),
                start_date: ActiveValue::Set(cmd.start_date),
                end_date: ActiveValue::Set(cmd.end_date),
                status: ActiveValue::Set(BudgetStatus::Active.as_str().to_string()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            budget_detail(&db_tx, model).await
        })?;

        tracing::info!(budget_id = %detail.budget.id, %department_id, "budget created");
        self.notify_budget_created(actor, &detail.budget).await;
        Ok(detail)
    }

    async fn notify_budget_created(&self, actor: &Actor, budget: &Budget) {
        let recipients = match users::Entity::find()
            .filter(users::Column::DepartmentId.eq(budget.department_id))
            .filter(users::Column::Active.eq(true))
            .filter(users::Column::Id.ne(actor.id))
            .all(&self.database)
            .await
        {
            Ok(recipients) => recipients,
            Err(err) => {
                tracing::warn!(budget_id = %budget.id, "cannot resolve budget audience: {err}");
                return;
            }
        };

        for recipient in recipients {
            self.emit(NotificationNew::new(
                recipient.id,
                "New Budget Created",
                format!(
                    "A new budget \"{}\" with {} has been created for your department.",
                    budget.name, budget.amount
                ),
                NotificationKind::Info,
            ))
            .await;
        }
    }

    pub async fn budget(&self, actor: &Actor, budget_id: Uuid) -> ResultEngine<BudgetDetail> {
        let model = self.scoped_budget(&self.database, actor, budget_id).await?;
        budget_detail(&self.database, model).await
    }

    /// Lists the budgets visible to `actor`, newest first.
    pub async fn list_budgets(
        &self,
        actor: &Actor,
        filter: &BudgetListFilter,
        pagination: Pagination,
    ) -> ResultEngine<Page<BudgetDetail>> {
        let scope = Scope::for_actor(actor, ResourceKind::Budget);
        let mut query = budgets::Entity::find().filter(scope.budget_condition());
        if let Some(department_id) = filter.department_id {
            query = query.filter(budgets::Column::DepartmentId.eq(department_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(budgets::Column::CategoryId.eq(category_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(budgets::Column::Status.eq(status.as_str()));
        }
        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(budgets::Column::Name)))
                    .like(format!("%{}%", search.to_lowercase())),
            );
        }

        let total = query.clone().count(&self.database).await?;
        let models = query
            .order_by_desc(budgets::Column::CreatedAt)
            .offset(pagination.offset())
            .limit(pagination.limit)
            .all(&self.database)
            .await?;
        let details = budget_details(&self.database, models).await?;
        Ok(Page::new(details, total, pagination))
    }

    /// Edits a budget. A new `amount` goes through the allocation floor.
    pub async fn update_budget(
        &self,
        actor: &Actor,
        budget_id: Uuid,
        update: BudgetUpdate,
    ) -> ResultEngine<BudgetDetail> {
        with_tx!(self, |db_tx| {
            let budget = self.managed_budget(&db_tx, actor, budget_id).await?;
            if budget.is_archived() {
                return Err(EngineError::InvalidState(
                    "archived budgets cannot be edited".to_string(),
                ));
            }

            let start_date = update.start_date.unwrap_or(budget.start_date);
            let end_date = update.end_date.unwrap_or(budget.end_date);
            if end_date < start_date {
                return Err(EngineError::InvalidInput(
                    "end_date must not be before start_date".to_string(),
                ));
            }

            if let Some(amount) = update.amount {
                self.adjust_allocation(&db_tx, &budget, amount).await?;
            }

            let mut active = budgets::ActiveModel {
                id: ActiveValue::Unchanged(budget.id),
                start_date: ActiveValue::Set(start_date),
                end_date: ActiveValue::Set(end_date),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            if let Some(name) = update.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required_text(name, "budget name")?);
            }
            if let Some(period) = update.period {
                active.period = ActiveValue::Set(period.as_str().to_string());
            }
            let model = active.update(&db_tx).await?;
            budget_detail(&db_tx, model).await
        })
    }

    /// Soft-deletes a budget. Expenses keep pointing at it.
    pub async fn archive_budget(&self, actor: &Actor, budget_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let budget = self.managed_budget(&db_tx, actor, budget_id).await?;
            budgets::ActiveModel {
                id: ActiveValue::Unchanged(budget.id),
                status: ActiveValue::Set(BudgetStatus::Archived.as_str().to_string()),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(%budget_id, "budget archived");
            Ok(())
        })
    }
}
