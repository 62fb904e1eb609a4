//! String-backed enums stored in the database.
//!
//! Each enum converts to and from its `scholaris_core` counterpart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use scholaris_core::attendance::AttendanceStatus as CoreAttendanceStatus;
use scholaris_core::auth::UserRole as CoreUserRole;
use scholaris_core::fees::FeeScopeKind;
use scholaris_core::ledger::{PaymentMethod as CorePaymentMethod, TransactionType as CoreTransactionType};
use scholaris_core::payment::PaymentStatus as CorePaymentStatus;
use scholaris_core::planning::{
    LessonPlanStatus as CoreLessonPlanStatus, SyllabusStatus as CoreSyllabusStatus, Weekday as CoreWeekday,
};

/// Maps a database enum onto a core enum with identical variants, both ways.
macro_rules! mirror_enum {
    ($db:ident, $core:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "proprietor")]
    Proprietor,
    #[sea_orm(string_value = "principal")]
    Principal,
    #[sea_orm(string_value = "bursar")]
    Bursar,
    #[sea_orm(string_value = "teacher")]
    Teacher,
    #[sea_orm(string_value = "parent")]
    Parent,
}

mirror_enum!(UserRole, CoreUserRole, [Admin, Proprietor, Principal, Bursar, Teacher, Parent]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum FeeScope {
    #[sea_orm(string_value = "school")]
    School,
    #[sea_orm(string_value = "section")]
    Section,
    #[sea_orm(string_value = "class")]
    Class,
    #[sea_orm(string_value = "student")]
    Student,
}

mirror_enum!(FeeScope, FeeScopeKind, [School, Section, Class, Student]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

mirror_enum!(TransactionType, CoreTransactionType, [Income, Expense]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "cheque")]
    Cheque,
    #[sea_orm(string_value = "mobile_money")]
    MobileMoney,
}

mirror_enum!(PaymentMethod, CorePaymentMethod, [Cash, BankTransfer, Cheque, MobileMoney]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failed")]
    Failed,
}

mirror_enum!(PaymentStatus, CorePaymentStatus, [Pending, Success, Failed]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "late")]
    Late,
    #[sea_orm(string_value = "excused")]
    Excused,
}

mirror_enum!(AttendanceStatus, CoreAttendanceStatus, [Present, Absent, Late, Excused]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum LessonPlanStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

mirror_enum!(LessonPlanStatus, CoreLessonPlanStatus, [Draft, Submitted, Approved, Rejected]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SyllabusStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
}

mirror_enum!(SyllabusStatus, CoreSyllabusStatus, [Pending, InProgress, Completed]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    #[sea_orm(string_value = "monday")]
    Monday,
    #[sea_orm(string_value = "tuesday")]
    Tuesday,
    #[sea_orm(string_value = "wednesday")]
    Wednesday,
    #[sea_orm(string_value = "thursday")]
    Thursday,
    #[sea_orm(string_value = "friday")]
    Friday,
    #[sea_orm(string_value = "saturday")]
    Saturday,
    #[sea_orm(string_value = "sunday")]
    Sunday,
}

mirror_enum!(Weekday, CoreWeekday, [Monday, Tuesday, Wednesday, Thursday, Friday, Saturday, Sunday]);
