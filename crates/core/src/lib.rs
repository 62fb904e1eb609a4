//! Core business logic for Scholaris.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `fees` - Which fee rules are charged to a student
//! - `ledger` - Paid totals across gateway and manual receipts
//! - `balance` - Student balances, debtors and collection summaries
//! - `grading` - Score to letter grade mapping
//! - `registration` - Registration IDs and admission numbers
//! - `payment` - Gateway payment lifecycle and the gateway port
//! - `attendance` - Attendance statuses and summaries
//! - `planning` - Lesson plan reviews, syllabus coverage, timetables and homework
//! - `auth` - Roles and password hashing

pub mod attendance;
pub mod auth;
pub mod balance;
pub mod fees;
pub mod grading;
pub mod ledger;
pub mod payment;
pub mod planning;
pub mod registration;
