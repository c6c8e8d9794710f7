//! Portfolio plan generation
//!
//! Asks the LLM for a JSON portfolio plan and pulls the JSON object out of
//! its reply. When the LLM is unreachable a fixed template keyed by risk
//! level is returned instead (if fallback is enabled).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::GatewayError;
use crate::gemini::TextGenerator;
use crate::models::{InvestorProfile, RiskLevel};
use crate::Result;

/// The collaborator behind portfolio requests on `/generate`
#[async_trait]
pub trait PortfolioPlanGenerator: Send + Sync {
    async fn generate_portfolio_plan(
        &self,
        query: &str,
        risk: Option<RiskLevel>,
        language: &str,
    ) -> Result<String>;
}

//
// ================= Plan document =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    pub equity_percent: u32,
    pub debt_percent: u32,
    pub mutualfunds_percent: u32,
    pub bonds_percent: u32,
    pub gold_percent: u32,
    pub cash_percent: u32,
}

impl Allocation {
    pub fn total(&self) -> u32 {
        self.equity_percent
            + self.debt_percent
            + self.mutualfunds_percent
            + self.bonds_percent
            + self.gold_percent
            + self.cash_percent
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundPick {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ticker_or_info: String,
    pub why: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPick {
    pub name: String,
    pub exchange: String,
    pub why: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankPick {
    pub name: String,
    pub product: String,
    pub why: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondPick {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub why: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPlan {
    #[serde(rename = "type")]
    pub kind: String,
    pub language: String,
    pub risk_level: RiskLevel,
    pub risk_score: u8,
    pub time_horizon_years: u32,
    pub capital: String,
    pub monthly_investment: String,
    pub allocation: Allocation,
    pub projected_annual_return_estimate: String,
    pub projected_notes: String,
    pub recommended_mutual_funds: Vec<FundPick>,
    pub recommended_stocks: Vec<StockPick>,
    pub recommended_banks_for_debt: Vec<BankPick>,
    pub recommended_bonds: Vec<BondPick>,
    pub risks_and_mitigations: Vec<String>,
    pub action_plan: Vec<String>,
    pub confidence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralAnswer {
    #[serde(rename = "type")]
    pub kind: String,
    pub language: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

//
// ================= Advisor =================
//

pub struct PortfolioAdvisor {
    generator: Arc<dyn TextGenerator>,
    fallback_on_error: bool,
}

impl PortfolioAdvisor {
    pub fn new(generator: Arc<dyn TextGenerator>, fallback_on_error: bool) -> Self {
        Self {
            generator,
            fallback_on_error,
        }
    }

    /// Produce a plan document (or a general answer) for an investor profile
    pub async fn advise(&self, profile: &InvestorProfile) -> Result<Value> {
        let prompt = build_portfolio_prompt(profile);

        match self.generator.generate(&prompt).await {
            Ok(raw) => {
                info!(response_chars = raw.len(), "Portfolio plan generated by LLM");
                Ok(parse_plan_output(&raw))
            }
            Err(e) if self.fallback_on_error => {
                warn!("LLM portfolio call failed, using local fallback plan: {}", e);
                let mut fallback = local_fallback(profile)?;
                fallback["notice"] = json!("LLM call failed; returned fallback response.");
                Ok(fallback)
            }
            Err(e) => Err(GatewayError::PortfolioError(e.to_string())),
        }
    }
}

#[async_trait]
impl PortfolioPlanGenerator for PortfolioAdvisor {
    async fn generate_portfolio_plan(
        &self,
        query: &str,
        risk: Option<RiskLevel>,
        language: &str,
    ) -> Result<String> {
        let profile = InvestorProfile::from_query(query, risk, language);
        let plan = self.advise(&profile).await?;
        Ok(serde_json::to_string(&plan)?)
    }
}

//
// ================= Prompt =================
//

fn is_english(language: &str) -> bool {
    matches!(language.trim().to_lowercase().as_str(), "" | "en" | "english")
}

/// Zero and negative amounts count as "not given"
fn format_rupees(amount: Option<f64>) -> Option<String> {
    amount.filter(|a| *a > 0.0).map(|a| format!("₹{}", a))
}

pub fn build_portfolio_prompt(profile: &InvestorProfile) -> String {
    let capital = format_rupees(profile.capital).unwrap_or_else(|| "N/A".to_string());
    let sip = format_rupees(profile.monthly_investment)
        .map(|s| format!("{} / month", s))
        .unwrap_or_else(|| "N/A".to_string());
    let preferences = if profile.preferences.is_empty() {
        "Not specified".to_string()
    } else {
        profile.preferences.join(", ")
    };
    let query = profile
        .query
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .unwrap_or("Portfolio recommendation");
    let language_note = if is_english(profile.language()) {
        "Return final text in English.".to_string()
    } else {
        format!("Return final text in the user's language: {}.", profile.language())
    };

    format!(
        r#"You are an Indian financial advisor AI that returns only JSON. The user input:

- Capital: {capital}
- Monthly SIP: {sip}
- Risk appetite: {risk}
- Preferences: {preferences}
- Query: {query}
{language_note}

TASK:
1) If the query is a general question about investing ("What is", "How does", "Explain", or a short question), return JSON with an "answer" field and a "language" field.
2) Otherwise produce a DETAILED portfolio recommendation in JSON only.

Return a single JSON object and nothing else, using these fields exactly:

{{
  "type": "portfolio" | "general",
  "language": "<language code>",
  "riskLevel": "<low|medium|high>",
  "riskScore": <number between 0-10>,
  "timeHorizonYears": <integer>,
  "capital": "<string, e.g. ₹100000>",
  "monthlyInvestment": "<string>",
  "allocation": {{
    "equity_percent": <number>,
    "debt_percent": <number>,
    "mutualfunds_percent": <number>,
    "bonds_percent": <number>,
    "gold_percent": <number>,
    "cash_percent": <number>
  }},
  "projectedAnnualReturnEstimate": "<e.g. 9-12%>",
  "projectedNotes": "<assumptions behind the projection>",
  "recommendedMutualFunds": [{{"name": "", "type": "", "tickerOrInfo": "", "why": ""}}],
  "recommendedStocks": [{{"name": "", "exchange": "NSE/BSE", "why": ""}}],
  "recommendedBanksForDebt": [{{"name": "", "product": "<FD / Savings / Corporate FD>", "why": ""}}],
  "recommendedBonds": [{{"name": "", "type": "<Govt / PSU>", "why": ""}}],
  "risksAndMitigations": ["..."],
  "actionPlan": ["..."],
  "confidence": "<low|medium|high>"
}}

Rules:
- Allocation percentages must add up to 100
- Keep numbers realistic
- For a general question return {{"type": "general", "language": ..., "answer": "..."}}
- No text outside the JSON object
"#,
        risk = profile.risk(),
    )
}

//
// ================= Output parsing =================
//

/// Extract the outermost `{...}` from an LLM reply.
///
/// Replies that carry no parseable object are turned into an error document
/// that keeps the raw text.
pub fn parse_plan_output(raw: &str) -> Value {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        warn!("No JSON object found in LLM portfolio response");
        return json!({
            "type": "error",
            "message": "No JSON found in model response",
            "raw": raw,
        });
    };

    if end < start {
        return json!({
            "type": "error",
            "message": "No JSON found in model response",
            "raw": raw,
        });
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Failed to parse LLM portfolio JSON: {}", e);
            json!({
                "type": "error",
                "message": "Failed to parse model output as JSON",
                "raw": raw,
            })
        }
    }
}

//
// ================= Local fallback =================
//

const GENERAL_QUESTION_MARKERS: &[&str] =
    &["what", "how", "explain", "define", "difference", "meaning"];

fn looks_like_general_question(query: &str) -> bool {
    let lowered = query.to_lowercase();
    GENERAL_QUESTION_MARKERS.iter().any(|m| lowered.contains(m))
}

fn sip_answer(language: &str) -> &'static str {
    match language.trim().to_lowercase().as_str() {
        "hi" | "hindi" => "SIP (सिस्टमेटिक इन्वेस्टमेंट प्लान) आपको नियमित रूप से म्यूचुअल फंडों में एक निश्चित राशि निवेश करने देता है। यह अनुशासित निवेश और रुपया लागत औसत में मदद करता है।",
        "ta" | "tamil" => "SIP என்பது மியூச்சுவல் ஃபண்டுகளில் மாத்திரையாக தொகையை முதலீடு செய்வதற்கு உதவுகிறது; இது உட்பட்ட செலவைக் குறைக்கிறது.",
        "te" | "telugu" => "SIP అనేది మీచ్యువల్ ఫండ్స్‌లో న్లకం చేయడానికి సహాయపడుతుంది. ఇది ఖర్చు సరిపడే విధంగా ఉంటుంది.",
        "kn" | "kannada" => "SIP ಮ್ಯೂಚುಯಲ್ ಫಂಡ್ಗಳಲ್ಲಿ ನಿಯತ ಪ್ರಮಾಣದ ಹೂಡಿಕೆಯನ್ನು ಸಹಾಯ ಮಾಡುತ್ತದೆ; ಇದು ಅವಸರದ ನಿರ್ವಹಣೆಗೆ ಸಹಕಾರಿ.",
        "ml" | "malayalam" => "SIP മ്യൂച്വൽ ഫണ്ടുകളിൽ സ്ഥിരത്തവണ നിക്ഷേപം ചെയ്യാൻ സഹായിക്കുന്നു; ഇത് റൂಪಿ കോസ്റ്റ് ശരാശരി എന്നിവയുടെ ഗുണങ്ങള്‍ നല്‍കുന്നു.",
        _ => "SIP (Systematic Investment Plan) lets you invest a fixed amount regularly into mutual funds. It helps rupee cost averaging and disciplined investing.",
    }
}

fn allocation_for(risk: RiskLevel) -> (Allocation, &'static str, u8) {
    match risk {
        RiskLevel::High => (
            Allocation {
                equity_percent: 65,
                debt_percent: 10,
                mutualfunds_percent: 15,
                bonds_percent: 0,
                gold_percent: 5,
                cash_percent: 5,
            },
            "12-15%",
            8,
        ),
        RiskLevel::Medium => (
            Allocation {
                equity_percent: 45,
                debt_percent: 30,
                mutualfunds_percent: 15,
                bonds_percent: 5,
                gold_percent: 3,
                cash_percent: 2,
            },
            "8-11%",
            5,
        ),
        RiskLevel::Low => (
            Allocation {
                equity_percent: 20,
                debt_percent: 50,
                mutualfunds_percent: 20,
                bonds_percent: 5,
                gold_percent: 3,
                cash_percent: 2,
            },
            "6-8%",
            3,
        ),
    }
}

fn fund(name: &str, kind: &str, info: &str, why: &str) -> FundPick {
    FundPick {
        name: name.into(),
        kind: kind.into(),
        ticker_or_info: info.into(),
        why: why.into(),
    }
}

fn stock(name: &str, why: &str) -> StockPick {
    StockPick {
        name: name.into(),
        exchange: "NSE".into(),
        why: why.into(),
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Deterministic template plan, keyed only by risk level
pub fn fallback_plan(profile: &InvestorProfile) -> PortfolioPlan {
    let risk = profile.risk();
    let (allocation, projected, risk_score) = allocation_for(risk);

    PortfolioPlan {
        kind: "portfolio".into(),
        language: profile.language().to_string(),
        risk_level: risk,
        risk_score,
        time_horizon_years: 5,
        capital: format_rupees(profile.capital).unwrap_or_else(|| "N/A".into()),
        monthly_investment: format_rupees(profile.monthly_investment)
            .unwrap_or_else(|| "N/A".into()),
        allocation,
        projected_annual_return_estimate: projected.into(),
        projected_notes: "Projections based on historical ranges and not guaranteed. Assumes diversified equity returns and stable debt yields.".into(),
        recommended_mutual_funds: vec![
            fund("SBI Bluechip Fund", "Large cap", "SBI Bluechip", "Large-cap, steady performance"),
            fund("Parag Parikh Flexi Cap Fund", "Flexi cap", "PPFLEXI", "Diversified across caps"),
            fund("Axis Long Term Equity Fund", "ELSS / Equity", "AXISLT", "Tax-efficient and growth oriented"),
        ],
        recommended_stocks: vec![
            stock("Infosys", "Strong IT exporter with stable cash flows"),
            stock("HDFC Bank", "Leading private sector bank"),
            stock("Reliance Industries", "Diversified business & energy/retail growth"),
        ],
        recommended_banks_for_debt: vec![
            BankPick {
                name: "State Bank of India".into(),
                product: "FD".into(),
                why: "Largest PSU bank; stable returns".into(),
            },
            BankPick {
                name: "HDFC Bank".into(),
                product: "Fixed deposit".into(),
                why: "Good track record".into(),
            },
        ],
        recommended_bonds: vec![BondPick {
            name: "RBI Sovereign Gold Bond / Government Bonds".into(),
            kind: "Government".into(),
            why: "Low credit risk".into(),
        }],
        risks_and_mitigations: to_strings(&[
            "Market volatility: diversify",
            "Maintain emergency cash for 3-6 months",
            "Regular SIPs for rupee-cost averaging",
        ]),
        action_plan: to_strings(&[
            "Open a demat and mutual fund folio",
            "Start SIPs for selected mutual funds",
            "Allocate to FDs / bonds as per debt allocation",
            "Review quarterly and rebalance annually",
        ]),
        confidence: "medium".into(),
        notice: None,
    }
}

/// Fallback document: a short SIP answer for questions, a template plan otherwise
pub fn local_fallback(profile: &InvestorProfile) -> Result<Value> {
    let query = profile.query.as_deref().unwrap_or("");

    let document = if looks_like_general_question(query) {
        serde_json::to_value(GeneralAnswer {
            kind: "general".into(),
            language: profile.language().to_string(),
            answer: sip_answer(profile.language()).to_string(),
            notice: None,
        })?
    } else {
        serde_json::to_value(fallback_plan(profile))?
    };

    Ok(document)
}
