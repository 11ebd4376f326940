//! Purchase protocol: requirements, submission, response classification

use super::{Lotto645, read_json_body};
use crate::auth::AuthManager;
use crate::types::{AssignedSlot, PurchaseOutcome, TicketSelection};
use crate::utils::{self, next_saturday, round_for_draw_date};
use crate::{Error, Result};
use chrono::{Local, Months, NaiveDate};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// Date format of the purchase page's embedded form fields
const PAGE_DATE_FMT: &str = "%Y/%m/%d";

/// Initial backoff between submit attempts; doubles up to the configured cap
const SUBMIT_BACKOFF_MS: u64 = 500;

static DRAW_DATE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input#ROUND_DRAW_DATE").expect("valid selector"));
static PAY_DEADLINE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input#WAMT_PAY_TLMT_END_DT").expect("valid selector"));
static CUR_ROUND_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input#curRound").expect("valid selector"));
static BALANCE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.total_new strong").expect("valid selector"));

/// Dynamic values a purchase submission requires
///
/// Scraped fresh per attempt; the site may rotate per-session values, so
/// requirements are never reused across attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequirements {
    /// Readiness token from the pre-flight call (`ready_ip`)
    pub ready_token: String,
    /// Draw date of the round being bought into
    pub draw_date: String,
    /// Payment deadline embedded in the form
    pub payment_deadline: String,
    /// Round number
    pub round: u32,
}

/// Purchase submit response envelope
#[derive(Debug, Deserialize)]
struct BuyResponse {
    #[serde(rename = "loginYn", default)]
    login_yn: Option<String>,
    #[serde(default)]
    result: Option<BuyResult>,
}

/// `result` object of the submit response
#[derive(Debug, Deserialize)]
struct BuyResult {
    #[serde(rename = "resultMsg", default)]
    result_msg: Option<String>,
    #[serde(rename = "buyRound", default)]
    buy_round: Option<serde_json::Value>,
    #[serde(rename = "arrGameChoiceNum", default)]
    arr_game_choice_num: Option<Vec<String>>,
}

impl Lotto645 {
    /// Buy tickets for the upcoming round
    ///
    /// Validates the selection before any network call, then runs the
    /// purchase protocol with up to `purchase.max_attempts` submissions.
    /// HTML-shaped responses and network failures are retried with capped
    /// backoff; the first HTML-shaped response additionally triggers one
    /// re-login, since it usually means the session silently expired.
    /// Business failures are terminal and never retried.
    pub async fn buy(
        &self,
        auth: &mut AuthManager,
        selection: &TicketSelection,
    ) -> Result<PurchaseOutcome> {
        selection.validate()?;

        let max_attempts = self.settings.purchase.max_attempts;
        let backoff_cap = Duration::from_millis(self.settings.purchase.backoff_cap_ms);
        let mut backoff = Duration::from_millis(SUBMIT_BACKOFF_MS);
        let mut reauthed = false;
        let mut last_error = Error::internal("No purchase attempt was made");

        for attempt in 1..=max_attempts {
            let headers = self.game_headers(auth);
            match self.attempt_buy(&headers, selection).await {
                Ok(outcome) => return Ok(outcome),
                Err(e @ Error::MalformedResponse { .. }) => {
                    tracing::warn!(
                        "Purchase attempt {}/{} got a malformed response: {}",
                        attempt,
                        max_attempts,
                        e
                    );
                    last_error = e;
                    // TODO: probe the buy ledger before resubmitting; an
                    // HTML-shaped reply does not prove the purchase was not
                    // executed, so a retry can double-buy.
                    if !reauthed {
                        reauthed = true;
                        if let Err(relogin_error) = auth.relogin().await {
                            tracing::warn!("Re-login failed: {}", relogin_error);
                        }
                    }
                }
                Err(e @ Error::Request { .. }) => {
                    tracing::warn!(
                        "Purchase attempt {}/{} failed at the network level: {}",
                        attempt,
                        max_attempts,
                        e
                    );
                    last_error = e;
                }
                Err(e) => return Err(e),
            }

            if attempt < max_attempts {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(backoff_cap);
            }
        }

        Err(last_error)
    }

    /// One full purchase attempt: requirements, body, submit, classify
    async fn attempt_buy(
        &self,
        headers: &HeaderMap,
        selection: &TicketSelection,
    ) -> Result<PurchaseOutcome> {
        let requirements = self.fetch_requirements(headers).await?;
        let form = self.build_purchase_form(selection, &requirements)?;

        let url = self.game_url("/olotto/game/execBuy.do");
        let response = self
            .transport
            .post(&url, Some(headers.clone()), Some(&form))
            .await?;

        self.classify_submit_response(response).await
    }

    /// Gather the dynamic purchase requirements
    ///
    /// The pre-flight call must succeed; the purchase page scrape may fail
    /// (layout drift), in which case the draw date, payment deadline, and
    /// round are computed from the calendar and the configured anchor so the
    /// workflow stays functional in degraded mode.
    pub(super) async fn fetch_requirements(
        &self,
        headers: &HeaderMap,
    ) -> Result<PurchaseRequirements> {
        let ready_token = self.fetch_ready_token(headers).await?;

        let url = self.game_url("/olotto/game/game645.do");
        let response = self
            .transport
            .get(&url, Some(headers.clone()), None)
            .await?;
        let html = response.text().await.map_err(|e| Error::request(url.as_str(), e))?;

        let today = Local::now().date_naive();
        Ok(match scrape_purchase_page(&html) {
            Some(page) => {
                let purchase = &self.settings.purchase;
                let round = page.round.unwrap_or_else(|| {
                    let draw = NaiveDate::parse_from_str(&page.draw_date, PAGE_DATE_FMT)
                        .unwrap_or_else(|_| next_saturday(today));
                    round_for_draw_date(purchase.anchor_round, purchase.anchor_draw_date, draw)
                });
                PurchaseRequirements {
                    ready_token,
                    draw_date: page.draw_date,
                    payment_deadline: page.payment_deadline,
                    round,
                }
            }
            None => {
                tracing::warn!("Purchase page scrape failed, falling back to calendar arithmetic");
                self.fallback_requirements(ready_token, today)
            }
        })
    }

    /// Pre-flight call that hands out the readiness token
    async fn fetch_ready_token(&self, headers: &HeaderMap) -> Result<String> {
        let mut headers = headers.clone();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let url = self.game_url("/olotto/game/egovUserReadySocket.json");
        let response = self.transport.post(&url, Some(headers), None).await?;
        let payload = read_json_body(response).await?;

        payload
            .get("ready_ip")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::malformed_response(
                    200,
                    "application/json",
                    utils::body_excerpt(&payload.to_string()),
                )
            })
    }

    /// Degraded-mode requirements when the page layout changed
    fn fallback_requirements(&self, ready_token: String, today: NaiveDate) -> PurchaseRequirements {
        let purchase = &self.settings.purchase;
        let draw_date = next_saturday(today);
        let payment_deadline = draw_date
            .checked_add_months(Months::new(12))
            .unwrap_or(draw_date);

        PurchaseRequirements {
            ready_token,
            draw_date: draw_date.format(PAGE_DATE_FMT).to_string(),
            payment_deadline: payment_deadline.format(PAGE_DATE_FMT).to_string(),
            round: round_for_draw_date(purchase.anchor_round, purchase.anchor_draw_date, draw_date),
        }
    }

    /// Render the submit form body
    fn build_purchase_form(
        &self,
        selection: &TicketSelection,
        requirements: &PurchaseRequirements,
    ) -> Result<Vec<(String, String)>> {
        let slots = selection.to_game_slots()?;

        Ok(vec![
            ("round".to_string(), requirements.round.to_string()),
            ("direct".to_string(), requirements.ready_token.clone()),
            (
                "nBuyAmount".to_string(),
                selection.amount_won().to_string(),
            ),
            ("param".to_string(), serde_json::to_string(&slots)?),
            (
                "ROUND_DRAW_DATE".to_string(),
                requirements.draw_date.clone(),
            ),
            (
                "WAMT_PAY_TLMT_END_DT".to_string(),
                requirements.payment_deadline.clone(),
            ),
            ("gameCnt".to_string(), selection.slot_count().to_string()),
        ])
    }

    /// Classify the submit response into an outcome or an error
    ///
    /// HTML-shaped bodies never reach the JSON parser; they become
    /// [`Error::MalformedResponse`] and count against the retry budget.
    async fn classify_submit_response(
        &self,
        response: reqwest::Response,
    ) -> Result<PurchaseOutcome> {
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(|e| Error::request(url, e))?;

        if content_type.contains("text/html") || body.trim_start().starts_with('<') {
            return Err(Error::malformed_response(
                status,
                content_type,
                utils::body_excerpt(&body),
            ));
        }

        let parsed: BuyResponse = serde_json::from_str(&body).map_err(|_| {
            Error::malformed_response(status, content_type, utils::body_excerpt(&body))
        })?;

        if parsed.login_yn.as_deref() == Some("N") {
            return Err(Error::permission_denied(
                "purchase endpoint reports the session is not logged in",
            ));
        }

        let result = parsed.result.unwrap_or(BuyResult {
            result_msg: None,
            buy_round: None,
            arr_game_choice_num: None,
        });
        let result_msg = result.result_msg.unwrap_or_else(|| "FAILURE".to_string());

        if !result_msg.eq_ignore_ascii_case("SUCCESS") {
            return Ok(PurchaseOutcome::BusinessFailure { reason: result_msg });
        }

        let round = match result.buy_round {
            Some(serde_json::Value::String(round)) => round,
            Some(serde_json::Value::Number(round)) => round.to_string(),
            _ => String::new(),
        };
        let slots = result
            .arr_game_choice_num
            .unwrap_or_default()
            .iter()
            .map(|entry| AssignedSlot::parse(entry))
            .collect();

        Ok(PurchaseOutcome::Success { round, slots })
    }

    /// Read the deposit balance off the my-page HTML
    pub async fn get_balance(&self, auth: &AuthManager) -> Result<String> {
        let headers = self.main_headers(auth);
        let url = self.main_url("/userSsl.do?method=myPage");
        let response = self.transport.post(&url, Some(headers), None).await?;
        let html = response.text().await.map_err(|e| Error::request(url.as_str(), e))?;

        let document = Html::parse_document(&html);
        document
            .select(&BALANCE_SELECTOR)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .ok_or_else(|| Error::internal("Balance element not found in my-page HTML"))
    }
}

/// Form fields scraped off the purchase page
#[derive(Debug, PartialEq, Eq)]
struct PageFields {
    draw_date: String,
    payment_deadline: String,
    round: Option<u32>,
}

/// Extract draw date, payment deadline, and round from the purchase page
///
/// Returns `None` when either date field is missing so the caller can fall
/// back to calendar arithmetic. A missing round alone is recoverable: the
/// caller derives it from the scraped draw date and the configured anchor.
fn scrape_purchase_page(html: &str) -> Option<PageFields> {
    let document = Html::parse_document(html);

    let input_value = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .and_then(|element| element.value().attr("value"))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let draw_date = input_value(&DRAW_DATE_SELECTOR)?;
    let payment_deadline = input_value(&PAY_DEADLINE_SELECTOR)?;
    let round = input_value(&CUR_ROUND_SELECTOR).and_then(|value| value.parse().ok());

    Some(PageFields {
        draw_date,
        payment_deadline,
        round,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const PAGE: &str = r#"
        <html><body>
          <form name="buyForm">
            <input type="hidden" id="ROUND_DRAW_DATE" value="2025/03/15"/>
            <input type="hidden" id="WAMT_PAY_TLMT_END_DT" value="2026/03/15"/>
            <input type="hidden" id="curRound" value="1163"/>
          </form>
        </body></html>"#;

    #[test]
    fn test_scrape_purchase_page() {
        let scraped = scrape_purchase_page(PAGE).unwrap();
        assert_eq!(
            scraped,
            PageFields {
                draw_date: "2025/03/15".to_string(),
                payment_deadline: "2026/03/15".to_string(),
                round: Some(1163),
            }
        );
    }

    #[test]
    fn test_scrape_purchase_page_without_round_still_yields_dates() {
        let page = PAGE.replace(r#"id="curRound" value="1163""#, r#"id="other" value="x""#);
        let scraped = scrape_purchase_page(&page).unwrap();
        assert_eq!(scraped.round, None);
        assert_eq!(scraped.draw_date, "2025/03/15");
    }

    #[test]
    fn test_scrape_purchase_page_missing_dates_is_none() {
        assert!(scrape_purchase_page("<html><body>maintenance</body></html>").is_none());
    }

    #[test]
    fn test_round_derivation_matches_page_round() {
        // 2025-03-15 is 1162 weeks after the 2002-12-07 anchor draw
        assert_eq!(
            round_for_draw_date(1, date(2002, 12, 7), date(2025, 3, 15)),
            1163
        );
    }
}
