//! Mail-merge for out-of-office replies.
//!
//! Tokens look like `{{startDate}}` or `{{approverName[2]}}`. Bracket indices
//! are 1-based; approver tokens without one resolve the first approver.
//! Unknown tokens are left in place.

use std::fmt::Write;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::engine::approval_chain::{ApproverField, approver_value};
use crate::model::member::Member;
use crate::model::request_approver::RequestApprover;
use crate::model::workspace::DEFAULT_DATE_FORMAT;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z]+)(?:\[(\d+)\])?\s*\}\}").expect("placeholder regex")
});

pub struct TemplateContext<'a> {
    pub member: &'a Member,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub leave_type: &'a str,
    pub approvers: &'a [RequestApprover],
    pub date_format: &'a str,
}

pub fn render_template(template: &str, ctx: &TemplateContext<'_>) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            // Indices too large for usize still mean "past the end".
            let index = caps
                .get(2)
                .map_or(1, |m| m.as_str().parse::<usize>().unwrap_or(usize::MAX));
            resolve(&caps[1], index, ctx).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn resolve(token: &str, index: usize, ctx: &TemplateContext<'_>) -> Option<String> {
    let member = ctx.member;
    let value = match token {
        "firstName" => member.first_name.clone().unwrap_or_default(),
        "lastName" => member.last_name.clone().unwrap_or_default(),
        "name" => member.name.clone().unwrap_or_default(),
        "startDate" => format_date(ctx.start_date, ctx.date_format),
        "endDate" => format_date(ctx.end_date, ctx.date_format),
        "returnDate" => ctx
            .return_date
            .map(|d| format_date(d, ctx.date_format))
            .unwrap_or_default(),
        "leaveType" => ctx.leave_type.to_string(),
        "approverName" | "managerName" => approver_value(ctx.approvers, index, ApproverField::Name),
        "approverMail" | "managerMail" => {
            approver_value(ctx.approvers, index, ApproverField::Email)
        }
        _ => return None,
    };
    Some(value)
}

/// Formats with `fmt`, falling back to the default format when `fmt` is not
/// a valid date pattern.
pub fn format_date(date: NaiveDate, fmt: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(fmt)).is_ok() {
        return out;
    }
    date.format(DEFAULT_DATE_FORMAT).to_string()
}
