//! Budget primitives.
//!
//! A `Budget` is a departmental allocation (`amount`) with a running total of
//! approved spend (`spent`). `spent` is only ever moved by the approval path
//! in `ops::ledger`; nothing recomputes it from expense history.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BudgetPeriod {
    Monthly,
    Quarterly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl TryFrom<&str> for BudgetPeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "MONTHLY" => Ok(Self::Monthly),
            "QUARTERLY" => Ok(Self::Quarterly),
            "YEARLY" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidInput(format!(
                "invalid budget period: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BudgetStatus {
    Active,
    Archived,
}

impl BudgetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl TryFrom<&str> for BudgetStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ACTIVE" => Ok(Self::Active),
            "ARCHIVED" => Ok(Self::Archived),
            other => Err(EngineError::InvalidInput(format!(
                "invalid budget status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub department_id: Uuid,
    pub category_id: Uuid,
    pub owner_id: Uuid,
    pub amount: Money,
    pub spent: Money,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BudgetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// `amount - spent`. Never stored.
    pub fn remaining(&self) -> Money {
        self.amount - self.spent
    }

    pub fn is_archived(&self) -> bool {
        self.status == BudgetStatus::Archived
    }

    /// Checks a proposed new allocation against the current spend.
    pub fn check_allocation(&self, new_amount: Money) -> ResultEngine<()> {
        if new_amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "budget amount must be >= 0".to_string(),
            ));
        }
        if new_amount < self.spent {
            return Err(EngineError::InvalidAmount(format!(
                "budget amount {new_amount} cannot be less than already spent {}",
                self.spent
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub department_id: Uuid,
    pub category_id: Uuid,
    pub owner_id: Uuid,
    pub amount_minor: i64,
    pub spent_minor: i64,
    pub period: String,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::departments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| {
            EngineError::DataIntegrity(format!("budget {} has invalid {what}", model.id))
        };
        Ok(Self {
            id: model.id,
            period: BudgetPeriod::try_from(model.period.as_str())
                .map_err(|_| corrupt("period"))?,
            status: BudgetStatus::try_from(model.status.as_str())
                .map_err(|_| corrupt("status"))?,
            name: model.name,
            department_id: model.department_id,
            category_id: model.category_id,
            owner_id: model.owner_id,
            amount: Money::new(model.amount_minor),
            spent: Money::new(model.spent_minor),
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(amount: i64, spent: i64) -> Budget {
        let now = Utc::now();
        let today = now.date_naive();
        Budget {
            id: Uuid::new_v4(),
            name: "Travel".to_string(),
            department_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            amount: Money::new(amount),
            spent: Money::new(spent),
            period: BudgetPeriod::Monthly,
            start_date: today,
            end_date: today,
            status: BudgetStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn remaining_is_amount_minus_spent() {
        assert_eq!(budget(100_000, 20_000).remaining(), Money::new(80_000));
    }

    #[test]
    fn allocation_cannot_drop_below_spent() {
        let b = budget(100_000, 35_000);
        assert!(b.check_allocation(Money::new(35_000)).is_ok());
        assert!(b.check_allocation(Money::new(200_000)).is_ok());
        assert!(matches!(
            b.check_allocation(Money::new(34_999)),
            Err(EngineError::InvalidAmount(_))
        ));
    }
}
