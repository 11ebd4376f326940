//! Verification protocol: ledger query, detail fetch, normalization
//!
//! The ledger and per-ticket detail endpoints have drifted across site
//! revisions and report the same facts under different field names, so
//! everything here reads `serde_json::Value` through prioritized candidate
//! tables instead of binding to one wire shape. Partial failure is normal:
//! a ledger that does not parse yields the no-data sentinel, and an entry
//! whose detail fetch fails is skipped, not fatal.

use super::{Lotto645, read_json_body};
use crate::auth::AuthManager;
use crate::types::{
    Ball, SLOT_LABELS, SelectionMethod, SlotLine, WinStatus, WinningCheck, WinningRecord,
};
use crate::utils::{format_money, search_date_range};
use crate::{Error, Result};
use chrono::Local;
use reqwest::header::HeaderMap;
use serde_json::Value;

/// Product code of Lotto 6/45 in the ledger
const LOTTO_PRODUCT_CODE: &str = "LO40";

// Candidate field tables, exact names in priority order.
const ROUND_FIELDS: [&str; 4] = ["buyRound", "round", "drwNo", "ROUND"];
const PRODUCT_FIELDS: [&str; 2] = ["lottoId", "productCode"];
const WIN_AMOUNT_FIELDS: [&str; 4] = ["winAmt", "prizeAmt", "winMoney", "money"];
const PURCHASE_DATE_FIELDS: [&str; 3] = ["buyDt", "orderDt", "purchaseDate"];
const RESULT_DATE_FIELDS: [&str; 3] = ["drwDt", "winDt", "announceDt"];
const ORDER_NO_FIELDS: [&str; 3] = ["orderNo", "ordrNo", "order_no"];
const BARCODE_FIELDS: [&str; 2] = ["barcode", "barCd"];
const ISSUE_NO_FIELDS: [&str; 3] = ["issueNo", "issuNo", "issue_no"];
const SLOT_LIST_FIELDS: [&str; 4] = ["list", "games", "slots", "gameList"];
const SLOT_LABEL_FIELDS: [&str; 3] = ["alpabet", "alphabet", "slot"];
const SLOT_NUMBER_FIELDS: [&str; 3] = ["arrGameChoiceNum", "numbers", "gameNum"];
const WIN_GRADE_FIELDS: [&str; 3] = ["winGrade", "rank", "grade"];
const WIN_NUMBER_FIELDS: [&str; 3] = ["winNums", "drwtNums", "lottoWinNums"];
const METHOD_FIELDS: [&str; 6] = [
    "genType",
    "gen_type",
    "buyMethod",
    "slctMthd",
    "selectType",
    "gameType",
];
const METHOD_KEYWORDS: [&str; 3] = ["gentype", "method", "slct"];

impl Lotto645 {
    /// Check the last week's purchases for winnings
    ///
    /// Read-only and tolerant of partial failure: a ledger that is not
    /// parseable JSON (or carries no list) yields [`WinningCheck::NoData`];
    /// individual detail fetches that fail are skipped. Only transport-level
    /// failures of the ledger query itself propagate.
    pub async fn check_winnings(&self, auth: &AuthManager) -> Result<WinningCheck> {
        let headers = self.main_headers(auth);

        self.warm_main_page(&headers).await;

        let entries = self.fetch_ledger(&headers).await?;
        let Some((round, selected)) = select_latest_round(&entries) else {
            return Ok(WinningCheck::NoData);
        };

        let mut purchase_date = String::new();
        let mut result_date = String::new();
        let mut lines = Vec::new();

        for entry in &selected {
            // Site dates are zero-padded year-first, so string order is
            // chronological order.
            if let Some(date) = string_field(entry, &PURCHASE_DATE_FIELDS)
                && date > purchase_date
            {
                purchase_date = date;
            }
            if result_date.is_empty()
                && let Some(date) = string_field(entry, &RESULT_DATE_FIELDS)
            {
                result_date = date;
            }

            match self.fetch_ticket_detail(&headers, entry).await {
                Ok(mut detail) => lines.append(&mut detail),
                Err(e) => {
                    tracing::warn!("Ticket detail fetch failed, skipping entry: {}", e);
                }
            }
        }

        Ok(WinningCheck::Record(WinningRecord {
            round,
            total_prize: format_money(sum_win_amounts(&selected)),
            purchase_date,
            result_date,
            lines,
        }))
    }

    /// Best-effort warm-up GET; failure is logged, never fatal
    async fn warm_main_page(&self, headers: &HeaderMap) {
        let url = self.main_url("/common.do?method=main");
        if let Err(e) = self.transport.get(&url, Some(headers.clone()), None).await {
            tracing::warn!("Main page warm-up failed, continuing: {}", e);
        }
    }

    /// Query the purchase ledger for the trailing week
    ///
    /// Unparseable payloads and missing list fields come back as an empty
    /// vec (the caller turns that into the no-data sentinel); only network
    /// failures are errors.
    async fn fetch_ledger(&self, headers: &HeaderMap) -> Result<Vec<Value>> {
        let (start, end) = search_date_range(Local::now().date_naive());
        let url = self.main_url("/myPage.do");
        let params = [
            ("method", "lottoBuyListJson"),
            ("nowPage", "1"),
            ("searchStartDate", start.as_str()),
            ("searchEndDate", end.as_str()),
            ("winGrade", "2"),
            ("lottoId", LOTTO_PRODUCT_CODE),
            ("sortOrder", "DESC"),
        ];

        let response = self
            .transport
            .get(&url, Some(headers.clone()), Some(&params))
            .await?;
        let payload = match read_json_body(response).await {
            Ok(payload) => payload,
            Err(e) if e.is_malformed_response() => {
                tracing::warn!("Ledger response is not JSON, treating as no data: {}", e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let Some(list) = payload
            .get("data")
            .and_then(|data| data.get("list"))
            .and_then(|list| list.as_array())
        else {
            tracing::warn!("Ledger payload lacks data.list, treating as no data");
            return Ok(Vec::new());
        };

        // The query is already filtered server-side; drop anything that
        // still identifies as a different product.
        Ok(list
            .iter()
            .filter(|entry| {
                string_field(entry, &PRODUCT_FIELDS)
                    .is_none_or(|product| product == LOTTO_PRODUCT_CODE)
            })
            .cloned()
            .collect())
    }

    /// Fetch one ticket's detail and normalize its slot lines
    async fn fetch_ticket_detail(
        &self,
        headers: &HeaderMap,
        entry: &Value,
    ) -> Result<Vec<SlotLine>> {
        let order_no = string_field(entry, &ORDER_NO_FIELDS)
            .ok_or_else(|| Error::internal("Ledger entry has no order number"))?;
        let barcode = string_field(entry, &BARCODE_FIELDS).unwrap_or_default();
        let issue_no = string_field(entry, &ISSUE_NO_FIELDS).unwrap_or_default();

        let url = self.main_url("/myPage.do");
        let params = [
            ("method", "lotto645DetailJson"),
            ("orderNo", order_no.as_str()),
            ("barcode", barcode.as_str()),
            ("issueNo", issue_no.as_str()),
        ];

        let response = self
            .transport
            .get(&url, Some(headers.clone()), Some(&params))
            .await?;
        let payload = read_json_body(response).await?;
        let root = payload.get("data").unwrap_or(&payload);

        let slots = SLOT_LIST_FIELDS
            .iter()
            .find_map(|field| root.get(*field).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default();
        let winning_numbers = WIN_NUMBER_FIELDS
            .iter()
            .find_map(|field| root.get(*field))
            .map(parse_numbers)
            .unwrap_or_default();

        Ok(slots
            .iter()
            .enumerate()
            .map(|(index, slot)| normalize_slot(slot, root, index, &winning_numbers))
            .collect())
    }
}

/// Keep only the entries of the newest round
///
/// A purchase may contain several lines in one round, so ties within the
/// maximum round all survive. Entries with no readable round are dropped.
fn select_latest_round(entries: &[Value]) -> Option<(u32, Vec<&Value>)> {
    let max_round = entries.iter().filter_map(entry_round).max()?;
    let selected = entries
        .iter()
        .filter(|entry| entry_round(entry) == Some(max_round))
        .collect();
    Some((max_round, selected))
}

/// Sum the reported win amounts; non-numeric amounts are skipped
fn sum_win_amounts(entries: &[&Value]) -> i64 {
    entries
        .iter()
        .filter_map(|entry| amount_field(entry, &WIN_AMOUNT_FIELDS))
        .sum()
}

/// Normalize one detail slot into a [`SlotLine`]
fn normalize_slot(slot: &Value, root: &Value, index: usize, winning_numbers: &[u8]) -> SlotLine {
    let label = string_field(slot, &SLOT_LABEL_FIELDS)
        .unwrap_or_else(|| SLOT_LABELS.get(index).copied().unwrap_or("?").to_string());
    let numbers = SLOT_NUMBER_FIELDS
        .iter()
        .find_map(|field| slot.get(*field))
        .map(parse_numbers)
        .unwrap_or_default();
    let balls = numbers
        .iter()
        .map(|&number| Ball {
            number,
            matched: winning_numbers.contains(&number),
        })
        .collect();

    SlotLine {
        label,
        status: WinStatus::from_grade(int_field(slot, &WIN_GRADE_FIELDS)),
        method: selection_method(slot, root),
        balls,
    }
}

/// Infer how a slot's numbers were chosen
///
/// Strategy, in priority order over the slot first and the payload root
/// second: exact candidate field names, then any field whose name contains
/// a method-related keyword, then per-slot parameter blobs (which may be
/// JSON-encoded strings needing a nested parse). `Unknown` is the normal
/// terminal answer when nothing matches.
fn selection_method(slot: &Value, root: &Value) -> SelectionMethod {
    for source in [slot, root] {
        if let Some(method) = method_from_fields(source) {
            return method;
        }
    }
    for source in [slot, root] {
        if let Some(method) = method_from_param_blob(source) {
            return method;
        }
    }
    SelectionMethod::Unknown
}

fn method_from_fields(value: &Value) -> Option<SelectionMethod> {
    let object = value.as_object()?;

    for name in METHOD_FIELDS {
        if let Some(raw) = object.get(name).and_then(value_to_string) {
            let method = SelectionMethod::from_raw(&raw);
            if method != SelectionMethod::Unknown {
                return Some(method);
            }
        }
    }

    for (name, field) in object {
        let lower = name.to_ascii_lowercase();
        if METHOD_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
            && let Some(raw) = value_to_string(field)
        {
            let method = SelectionMethod::from_raw(&raw);
            if method != SelectionMethod::Unknown {
                return Some(method);
            }
        }
    }

    None
}

/// Dig the method out of a nested `param` blob
fn method_from_param_blob(value: &Value) -> Option<SelectionMethod> {
    let blob = value.get("param")?;
    let parsed: Value = match blob {
        Value::String(encoded) => serde_json::from_str(encoded).ok()?,
        other => other.clone(),
    };

    match parsed {
        Value::Array(items) => items.iter().find_map(method_from_fields),
        object @ Value::Object(_) => method_from_fields(&object),
        _ => None,
    }
}

/// Round number of a ledger entry
fn entry_round(entry: &Value) -> Option<u32> {
    for field in ROUND_FIELDS {
        let Some(value) = entry.get(field) else {
            continue;
        };
        if let Some(round) = value.as_u64() {
            return u32::try_from(round).ok();
        }
        if let Some(raw) = value.as_str() {
            // "1151회" style values carry a suffix
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            if let Ok(round) = digits.parse() {
                return Some(round);
            }
        }
    }
    None
}

/// First candidate field present as a non-empty string
fn string_field(value: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|field| value.get(*field).and_then(value_to_string))
}

/// First candidate field parseable as an integer
fn int_field(value: &Value, candidates: &[&str]) -> Option<i64> {
    candidates
        .iter()
        .find_map(|field| value.get(*field).and_then(value_to_i64))
}

/// Like [`int_field`], named for its use on money fields
fn amount_field(value: &Value, candidates: &[&str]) -> Option<i64> {
    int_field(value, candidates)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches('원')
            .replace(',', "")
            .parse()
            .ok(),
        _ => None,
    }
}

/// Parse ball numbers out of whatever shape the endpoint used
///
/// Accepts arrays of numbers or strings, and delimited strings
/// (`"01|02|.."` or `"01,02,.."`). Values outside 1..=45 are discarded —
/// that also drops the selection-mode digits some renditions append.
fn parse_numbers(value: &Value) -> Vec<u8> {
    let candidates: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(value_to_string).collect(),
        Value::String(s) => s
            .split(['|', ',', ' '])
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    candidates
        .iter()
        .filter_map(|raw| raw.trim().parse::<u8>().ok())
        .filter(|number| (1..=45).contains(number))
        .collect()
}
