//! Report repository: balances, debtors and collection figures.
//!
//! Every report loads the school's rows in a fixed number of queries
//! (students, memberships, fees, transactions, payments) and hands them to
//! [`BalanceCalculator`] for a single in-memory pass. No query is issued
//! per student.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use scholaris_core::balance::{BalanceCalculator, CollectionSummary, StudentBalance};
use scholaris_core::fees::{FeeRule, FeeScope, PeriodFilter, StudentProfile};
use scholaris_core::grading::Grade;
use scholaris_core::ledger::{GatewayReceipt, ManualReceipt, PaymentMethod as CorePaymentMethod};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    classes, exam_results, exams, fees, payments, section_students, sections, students,
    subjects, transactions,
    sea_orm_active_enums::{PaymentStatus, TransactionType},
};

/// Placeholder for a missing section or class name.
pub const NOT_ASSIGNED: &str = "N/A";

/// Error types for report operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Student not found in this school.
    #[error("Student not found: {0}")]
    StudentNotFound(Uuid),

    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Which students a snapshot covers.
#[derive(Debug, Clone, Copy)]
enum Cohort {
    /// All active students of the school.
    Active,
    /// Active members of one section.
    Section(Uuid),
    /// One student, active or not.
    Student(Uuid),
}

/// Rows needed to compute balances, converted to domain types.
struct Snapshot {
    students: Vec<students::Model>,
    profiles: Vec<StudentProfile>,
    sections_by_student: HashMap<Uuid, Vec<Uuid>>,
    fees: Vec<FeeRule>,
    manual: Vec<ManualReceipt>,
    gateway: Vec<GatewayReceipt>,
}

/// A student who owes money.
#[derive(Debug, Clone, Serialize)]
pub struct DebtorRow {
    /// Student.
    pub student_id: Uuid,
    /// Student name.
    pub student_name: String,
    /// Admission number.
    pub admission_number: String,
    /// Section name, or [`NOT_ASSIGNED`].
    pub section_name: String,
    /// Class name, or [`NOT_ASSIGNED`].
    pub class_name: String,
    /// Parent's name.
    pub parent_name: Option<String>,
    /// Parent's phone.
    pub parent_phone: Option<String>,
    /// Fees charged.
    pub total_fees: Decimal,
    /// Amount paid.
    pub total_paid: Decimal,
    /// Amount owed, always positive.
    pub balance: Decimal,
}

/// Income and expense figures over a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    /// Manual income plus successful gateway payments.
    pub total_income: Decimal,
    /// Manual expenses.
    pub total_expense: Decimal,
    /// Income minus expenses.
    pub net_income: Decimal,
    /// Fee income recorded manually.
    pub manual_fee_income: Decimal,
    /// Successful gateway payments.
    pub gateway_income: Decimal,
    /// Manual income by category.
    pub income_by_category: Vec<CategoryTotal>,
    /// Manual expenses by category.
    pub expense_by_category: Vec<CategoryTotal>,
}

/// Total of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// Category, "Uncategorized" when none was given.
    pub category: String,
    /// Sum of amounts.
    pub amount: Decimal,
}

/// Income collected through one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodTotal {
    /// Method, e.g. "cash" or "card".
    pub method: String,
    /// Whether the money came through the gateway.
    pub via_gateway: bool,
    /// Number of receipts.
    pub count: u64,
    /// Sum of amounts.
    pub amount: Decimal,
}

/// One graded exam on a report card.
#[derive(Debug, Clone, Serialize)]
pub struct ReportCardEntry {
    /// Exam.
    pub exam_id: Uuid,
    /// Exam title.
    pub exam_title: String,
    /// Subject name.
    pub subject_name: String,
    /// Score.
    pub score: Decimal,
    /// Exam maximum.
    pub max_score: Decimal,
    /// Letter grade.
    pub grade: String,
    /// Remark.
    pub remark: Option<String>,
}

/// A student's results for a period.
#[derive(Debug, Clone, Serialize)]
pub struct ReportCard {
    /// Student row.
    pub student: students::Model,
    /// Class name, or [`NOT_ASSIGNED`].
    pub class_name: String,
    /// Graded exams.
    pub entries: Vec<ReportCardEntry>,
    /// Sum of scores.
    pub total_score: Decimal,
    /// Sum of maximum scores.
    pub total_max_score: Decimal,
    /// Overall percentage, two decimals.
    pub percentage: Decimal,
    /// Grade of the overall percentage.
    pub overall_grade: Option<String>,
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
    calculator: BalanceCalculator,
}

impl ReportRepository {
    /// Creates a report repository that treats income categories containing
    /// `fee_marker` as fee payments.
    #[must_use]
    pub fn new(db: DatabaseConnection, fee_marker: &str) -> Self {
        Self {
            db,
            calculator: BalanceCalculator::new(fee_marker),
        }
    }

    /// Fees, payments and balance of one student.
    pub async fn payment_summary(
        &self,
        school_id: Uuid,
        student_id: Uuid,
        period: PeriodFilter,
    ) -> Result<StudentBalance, ReportError> {
        let snapshot = self.snapshot(school_id, Cohort::Student(student_id)).await?;
        let profile = snapshot
            .profiles
            .first()
            .ok_or(ReportError::StudentNotFound(student_id))?;

        Ok(self.calculator.student_balance(
            profile,
            &snapshot.fees,
            &snapshot.manual,
            &snapshot.gateway,
            period,
        ))
    }

    /// Active students with a positive balance, largest balance first.
    pub async fn debtors(
        &self,
        school_id: Uuid,
        section_id: Option<Uuid>,
    ) -> Result<Vec<DebtorRow>, ReportError> {
        let cohort = section_id.map_or(Cohort::Active, Cohort::Section);
        let snapshot = self.snapshot(school_id, cohort).await?;

        let section_names: HashMap<Uuid, String> = sections::Entity::find()
            .filter(sections::Column::SchoolId.eq(school_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.section_name))
            .collect();
        let class_names: HashMap<Uuid, String> = classes::Entity::find()
            .filter(classes::Column::SchoolId.eq(school_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.class_name))
            .collect();

        let by_id: HashMap<Uuid, &students::Model> =
            snapshot.students.iter().map(|s| (s.id, s)).collect();

        let mut rows: Vec<DebtorRow> = self
            .calculator
            .debtors(
                &snapshot.profiles,
                &snapshot.fees,
                &snapshot.manual,
                &snapshot.gateway,
            )
            .into_iter()
            .filter_map(|balance| {
                let student_id: Uuid = balance.student_id.into();
                let student = by_id.get(&student_id)?;
                let section_name = section_id
                    .or_else(|| {
                        snapshot
                            .sections_by_student
                            .get(&student_id)
                            .and_then(|ids| ids.first().copied())
                    })
                    .and_then(|id| section_names.get(&id).cloned())
                    .unwrap_or_else(|| NOT_ASSIGNED.to_string());
                let class_name = student
                    .class_id
                    .and_then(|id| class_names.get(&id).cloned())
                    .unwrap_or_else(|| NOT_ASSIGNED.to_string());

                Some(DebtorRow {
                    student_id,
                    student_name: student.student_name.clone(),
                    admission_number: student.admission_number.clone(),
                    section_name,
                    class_name,
                    parent_name: student.parent_name.clone(),
                    parent_phone: student.parent_phone.clone(),
                    total_fees: balance.total_fees,
                    total_paid: balance.total_paid,
                    balance: balance.balance,
                })
            })
            .collect();

        rows.sort_by(|a, b| b.balance.cmp(&a.balance).then_with(|| a.student_name.cmp(&b.student_name)));
        Ok(rows)
    }

    /// Expected, collected and outstanding fees of a school.
    pub async fn fee_collection(&self, school_id: Uuid) -> Result<CollectionSummary, ReportError> {
        let snapshot = self.snapshot(school_id, Cohort::Active).await?;
        Ok(self.calculator.collection_summary(
            &snapshot.profiles,
            &snapshot.fees,
            &snapshot.manual,
            &snapshot.gateway,
        ))
    }

    /// Income and expenses between two dates, inclusive.
    pub async fn financial_summary(
        &self,
        school_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<FinancialSummary, ReportError> {
        check_range(from, to)?;
        let rows = self.transactions_between(school_id, from, to).await?;
        let gateway = self.gateway_between(school_id, from, to).await?;

        let mut income_by_category = BTreeMap::new();
        let mut expense_by_category = BTreeMap::new();
        let mut summary = FinancialSummary::default();
        let ledger = self.calculator.ledger();

        for row in &rows {
            let category = row
                .category
                .clone()
                .unwrap_or_else(|| "Uncategorized".to_string());
            match row.transaction_type {
                TransactionType::Income => {
                    summary.total_income += row.amount;
                    *income_by_category.entry(category).or_insert(Decimal::ZERO) += row.amount;
                    if row.payment_id.is_none() && ledger.is_fee_category(row.category.as_deref()) {
                        summary.manual_fee_income += row.amount;
                    }
                }
                TransactionType::Expense => {
                    summary.total_expense += row.amount;
                    *expense_by_category.entry(category).or_insert(Decimal::ZERO) += row.amount;
                }
            }
        }

        // Linked transactions restate a gateway payment already counted below.
        let linked: Decimal = rows
            .iter()
            .filter(|r| r.transaction_type == TransactionType::Income && r.payment_id.is_some())
            .map(|r| r.amount)
            .sum();
        summary.gateway_income = gateway.iter().map(|p| p.amount).sum();
        summary.total_income += summary.gateway_income - linked;
        summary.net_income = summary.total_income - summary.total_expense;
        summary.income_by_category = into_totals(income_by_category);
        summary.expense_by_category = into_totals(expense_by_category);

        Ok(summary)
    }

    /// Income grouped by payment method, manual methods first.
    pub async fn payment_methods(
        &self,
        school_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<MethodTotal>, ReportError> {
        check_range(from, to)?;
        let rows = self.transactions_between(school_id, from, to).await?;
        let gateway = self.gateway_between(school_id, from, to).await?;

        let mut totals: Vec<MethodTotal> = CorePaymentMethod::ALL
            .iter()
            .map(|&method| {
                let matching = rows.iter().filter(|r| {
                    r.transaction_type == TransactionType::Income
                        && r.payment_id.is_none()
                        && CorePaymentMethod::from(r.payment_method) == method
                });
                MethodTotal {
                    method: method.as_str().to_string(),
                    via_gateway: false,
                    count: matching.clone().count() as u64,
                    amount: matching.map(|r| r.amount).sum(),
                }
            })
            .collect();

        let mut by_channel: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();
        for payment in &gateway {
            let entry = by_channel
                .entry(payment.payment_method.clone())
                .or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += payment.amount;
        }
        totals.extend(by_channel.into_iter().map(|(method, (count, amount))| MethodTotal {
            method,
            via_gateway: true,
            count,
            amount,
        }));

        Ok(totals)
    }

    /// A student's graded exams, optionally for one session or term.
    pub async fn report_card(
        &self,
        school_id: Uuid,
        student_id: Uuid,
        period: PeriodFilter,
    ) -> Result<ReportCard, ReportError> {
        let student = students::Entity::find_by_id(student_id)
            .filter(students::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await?
            .ok_or(ReportError::StudentNotFound(student_id))?;

        let class_name = match student.class_id {
            Some(id) => classes::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .map(|c| c.class_name),
            None => None,
        }
        .unwrap_or_else(|| NOT_ASSIGNED.to_string());

        let mut exam_query = exams::Entity::find().filter(exams::Column::SchoolId.eq(school_id));
        if let Some(session_id) = period.session_id {
            exam_query = exam_query.filter(exams::Column::SessionId.eq(Uuid::from(session_id)));
        }
        if let Some(term_id) = period.term_id {
            exam_query = exam_query.filter(exams::Column::TermId.eq(Uuid::from(term_id)));
        }
        let exams: HashMap<Uuid, exams::Model> = exam_query
            .all(&self.db)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let results = exam_results::Entity::find()
            .filter(exam_results::Column::StudentId.eq(student_id))
            .filter(exam_results::Column::ExamId.is_in(exams.keys().copied()))
            .order_by_asc(exam_results::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let subject_names: HashMap<Uuid, String> = subjects::Entity::find()
            .filter(subjects::Column::SchoolId.eq(school_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let entries: Vec<ReportCardEntry> = results
            .into_iter()
            .filter_map(|result| {
                let exam = exams.get(&result.exam_id)?;
                Some(ReportCardEntry {
                    exam_id: exam.id,
                    exam_title: exam.title.clone(),
                    subject_name: subject_names
                        .get(&exam.subject_id)
                        .cloned()
                        .unwrap_or_else(|| NOT_ASSIGNED.to_string()),
                    score: result.score,
                    max_score: exam.max_score,
                    grade: result.grade,
                    remark: result.remark,
                })
            })
            .collect();

        let total_score: Decimal = entries.iter().map(|e| e.score).sum();
        let total_max_score: Decimal = entries.iter().map(|e| e.max_score).sum();
        let (percentage, overall_grade) = if total_max_score > Decimal::ZERO {
            let pct = (total_score * Decimal::ONE_HUNDRED / total_max_score).round_dp(2);
            (pct, Some(Grade::from_score(pct).to_string()))
        } else {
            (Decimal::ZERO, None)
        };

        Ok(ReportCard {
            student,
            class_name,
            entries,
            total_score,
            total_max_score,
            percentage,
            overall_grade,
        })
    }

    async fn snapshot(&self, school_id: Uuid, cohort: Cohort) -> Result<Snapshot, DbErr> {
        let mut student_query =
            students::Entity::find().filter(students::Column::SchoolId.eq(school_id));
        match cohort {
            Cohort::Active => {
                student_query = student_query.filter(students::Column::IsActive.eq(true));
            }
            Cohort::Section(section_id) => {
                let members = sea_orm::sea_query::Query::select()
                    .column(section_students::Column::StudentId)
                    .from(section_students::Entity)
                    .and_where(section_students::Column::SectionId.eq(section_id))
                    .to_owned();
                student_query = student_query
                    .filter(students::Column::IsActive.eq(true))
                    .filter(students::Column::Id.in_subquery(members));
            }
            Cohort::Student(student_id) => {
                student_query = student_query.filter(students::Column::Id.eq(student_id));
            }
        }
        let students = student_query
            .order_by_asc(students::Column::StudentName)
            .all(&self.db)
            .await?;

        let mut sections_by_student: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in section_students::Entity::find()
            .filter(section_students::Column::StudentId.is_in(students.iter().map(|s| s.id)))
            .all(&self.db)
            .await?
        {
            sections_by_student
                .entry(row.student_id)
                .or_default()
                .push(row.section_id);
        }

        let fee_rows = fees::Entity::find()
            .filter(fees::Column::SchoolId.eq(school_id))
            .all(&self.db)
            .await?;
        let fee_periods: HashMap<Uuid, (Uuid, Uuid)> = fee_rows
            .iter()
            .map(|f| (f.id, (f.session_id, f.term_id)))
            .collect();

        let transaction_rows = transactions::Entity::find()
            .filter(transactions::Column::SchoolId.eq(school_id))
            .filter(transactions::Column::TransactionType.eq(TransactionType::Income))
            .all(&self.db)
            .await?;

        let payment_rows = payments::Entity::find()
            .filter(payments::Column::StudentId.in_subquery(
                sea_orm::sea_query::Query::select()
                    .column(students::Column::Id)
                    .from(students::Entity)
                    .and_where(students::Column::SchoolId.eq(school_id))
                    .to_owned(),
            ))
            .all(&self.db)
            .await?;

        let profiles = students
            .iter()
            .map(|s| to_profile(s, sections_by_student.get(&s.id).cloned().unwrap_or_default()))
            .collect();

        Ok(Snapshot {
            profiles,
            sections_by_student,
            fees: fee_rows.iter().filter_map(to_fee_rule).collect(),
            manual: transaction_rows.iter().map(to_manual_receipt).collect(),
            gateway: payment_rows
                .iter()
                .map(|p| to_gateway_receipt(p, fee_periods.get(&p.fee_id).copied()))
                .collect(),
            students,
        })
    }

    async fn transactions_between(
        &self,
        school_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<transactions::Model>, DbErr> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::SchoolId.eq(school_id));
        if let Some(from) = from {
            query = query.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(transactions::Column::TransactionDate.lte(to));
        }
        query.all(&self.db).await
    }

    /// Successful gateway payments whose settlement falls in the range.
    async fn gateway_between(
        &self,
        school_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<payments::Model>, DbErr> {
        let rows = payments::Entity::find()
            .filter(payments::Column::Status.eq(PaymentStatus::Success))
            .filter(payments::Column::StudentId.in_subquery(
                sea_orm::sea_query::Query::select()
                    .column(students::Column::Id)
                    .from(students::Entity)
                    .and_where(students::Column::SchoolId.eq(school_id))
                    .to_owned(),
            ))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter(|p| {
                let day = p.paid_at.unwrap_or(p.created_at).date_naive();
                from.is_none_or(|from| day >= from) && to.is_none_or(|to| day <= to)
            })
            .collect())
    }
}

fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), ReportError> {
    match (from, to) {
        (Some(start), Some(end)) if start > end => Err(ReportError::InvalidDateRange { start, end }),
        _ => Ok(()),
    }
}

fn into_totals(map: BTreeMap<String, Decimal>) -> Vec<CategoryTotal> {
    map.into_iter()
        .map(|(category, amount)| CategoryTotal { category, amount })
        .collect()
}

/// Converts a student row and their memberships into a billing profile.
pub(crate) fn to_profile(student: &students::Model, section_ids: Vec<Uuid>) -> StudentProfile {
    StudentProfile {
        id: student.id.into(),
        school_id: student.school_id.into(),
        class_id: student.class_id.map(Into::into),
        section_ids: section_ids.into_iter().map(Into::into).collect(),
    }
}

/// Converts a fee row; rows whose scope key is missing are dropped.
pub(crate) fn to_fee_rule(fee: &fees::Model) -> Option<FeeRule> {
    let scope = FeeScope::from_columns(
        fee.fee_scope.into(),
        fee.section_id.into(),
        fee.class_id.map(Into::into),
        fee.student_id.map(Into::into),
    );
    if scope.is_none() {
        tracing::warn!(fee_id = %fee.id, scope = ?fee.fee_scope, "Fee row has no scope target, skipping");
    }
    Some(FeeRule {
        id: fee.id.into(),
        school_id: fee.school_id.into(),
        session_id: fee.session_id.into(),
        term_id: fee.term_id.into(),
        amount: fee.amount,
        scope: scope?,
        is_active: fee.is_active,
    })
}

pub(crate) fn to_manual_receipt(row: &transactions::Model) -> ManualReceipt {
    ManualReceipt {
        student_id: row.student_id.map(Into::into),
        transaction_type: row.transaction_type.into(),
        category: row.category.clone(),
        amount: row.amount,
        payment_id: row.payment_id.map(Into::into),
        session_id: row.session_id.map(Into::into),
        term_id: row.term_id.map(Into::into),
        transaction_date: row.transaction_date,
    }
}

/// `period` is the session and term of the paid fee.
pub(crate) fn to_gateway_receipt(row: &payments::Model, period: Option<(Uuid, Uuid)>) -> GatewayReceipt {
    GatewayReceipt {
        student_id: row.student_id.into(),
        status: row.status.into(),
        amount: row.amount,
        session_id: period.map(|(session, _)| session.into()),
        term_id: period.map(|(_, term)| term.into()),
        paid_at: row.paid_at.map(|t| t.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range_rejects_inverted_dates() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(matches!(
            check_range(Some(start), Some(end)),
            Err(ReportError::InvalidDateRange { .. })
        ));
        assert!(check_range(Some(end), Some(start)).is_ok());
        assert!(check_range(None, Some(end)).is_ok());
    }

    #[test]
    fn test_into_totals_keeps_category_order() {
        let mut map = BTreeMap::new();
        map.insert("Uniform".to_string(), Decimal::from(300));
        map.insert("School Fee".to_string(), Decimal::from(1000));
        let totals = into_totals(map);
        assert_eq!(totals[0].category, "School Fee");
        assert_eq!(totals[1].amount, Decimal::from(300));
    }
}
