//! Quantity-tiered automatic discounts and the per-category discount state
//! of the tiered pricing model.

use serde::{Deserialize, Serialize};

use crate::input::percent;

/// `(minimum quantity, discount %)`, highest threshold first.
const BREAKPOINTS: &[(f64, f64)] = &[(500.0, 15.0), (350.0, 15.0), (200.0, 10.0), (50.0, 5.0)];

/// Automatic discount percentage for a quantity.
pub fn auto_discount(quantity: f64) -> f64 {
    if !quantity.is_finite() || quantity < 0.0 {
        return 0.0;
    }
    BREAKPOINTS
        .iter()
        .find(|(min, _)| quantity >= *min)
        .map(|(_, pct)| *pct)
        .unwrap_or(0.0)
}

/// Billed categories of the tiered model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Chatbot,
    Callbot,
    Advisor,
    Ta,
    Qa,
    Kms,
    Stt,
    Tts,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Chatbot,
        Category::Callbot,
        Category::Advisor,
        Category::Ta,
        Category::Qa,
        Category::Kms,
        Category::Stt,
        Category::Tts,
    ];

    /// Whether quantity changes re-derive this category's discount.
    pub fn auto_discounted(self) -> bool {
        matches!(
            self,
            Category::Chatbot | Category::Advisor | Category::Qa | Category::Ta | Category::Kms
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Chatbot => "Chatbot channels",
            Category::Callbot => "Callbot channels",
            Category::Advisor => "Advisor seats",
            Category::Ta => "TA seats",
            Category::Qa => "QA seats",
            Category::Kms => "KMS seats",
            Category::Stt => "STT channels",
            Category::Tts => "TTS channels",
        }
    }

    pub fn discount_label(self) -> &'static str {
        match self {
            Category::Chatbot => "Chatbot discount",
            Category::Callbot => "Callbot discount",
            Category::Advisor => "Advisor discount",
            Category::Ta => "TA discount",
            Category::Qa => "QA discount",
            Category::Kms => "KMS discount",
            Category::Stt => "STT discount",
            Category::Tts => "TTS discount",
        }
    }

    /// Bundle field holding this category's quantity.
    pub fn quantity_field(self) -> &'static str {
        match self {
            Category::Chatbot => "chatbot_channels",
            Category::Callbot => "callbot_channels",
            Category::Advisor => "advisor_seats",
            Category::Ta => "ta_seats",
            Category::Qa => "qa_seats",
            Category::Kms => "kms_seats",
            Category::Stt => "stt_channels",
            Category::Tts => "tts_channels",
        }
    }

    pub fn from_quantity_field(field: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.quantity_field() == field)
    }

    /// Bundle field holding this category's discount.
    pub fn discount_field(self) -> &'static str {
        match self {
            Category::Chatbot => "chatbot_discount",
            Category::Callbot => "callbot_discount",
            Category::Advisor => "advisor_discount",
            Category::Ta => "ta_discount",
            Category::Qa => "qa_discount",
            Category::Kms => "kms_discount",
            Category::Stt => "stt_discount",
            Category::Tts => "tts_discount",
        }
    }

    pub fn from_discount_field(field: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.discount_field() == field)
    }
}

/// Current discount percentage of every tiered category.
///
/// Writes are applied in arrival order and the latest one wins: a quantity
/// change re-derives an eligible category from [`auto_discount`], a global
/// write overwrites all eight, a category write overwrites one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountSpec {
    #[serde(rename = "chatbot_discount")]
    pub chatbot: f64,
    #[serde(rename = "callbot_discount")]
    pub callbot: f64,
    #[serde(rename = "advisor_discount")]
    pub advisor: f64,
    #[serde(rename = "ta_discount")]
    pub ta: f64,
    #[serde(rename = "qa_discount")]
    pub qa: f64,
    #[serde(rename = "kms_discount")]
    pub kms: f64,
    #[serde(rename = "stt_discount")]
    pub stt: f64,
    #[serde(rename = "tts_discount")]
    pub tts: f64,
}

impl DiscountSpec {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Chatbot => self.chatbot,
            Category::Callbot => self.callbot,
            Category::Advisor => self.advisor,
            Category::Ta => self.ta,
            Category::Qa => self.qa,
            Category::Kms => self.kms,
            Category::Stt => self.stt,
            Category::Tts => self.tts,
        }
    }

    fn slot(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::Chatbot => &mut self.chatbot,
            Category::Callbot => &mut self.callbot,
            Category::Advisor => &mut self.advisor,
            Category::Ta => &mut self.ta,
            Category::Qa => &mut self.qa,
            Category::Kms => &mut self.kms,
            Category::Stt => &mut self.stt,
            Category::Tts => &mut self.tts,
        }
    }

    /// Quantity of `category` changed. Categories outside the tier policy
    /// keep their discount.
    pub fn quantity_changed(&mut self, category: Category, quantity: f64) {
        if category.auto_discounted() {
            *self.slot(category) = auto_discount(quantity);
        }
    }

    pub fn set_global(&mut self, pct: f64) {
        let pct = percent(pct);
        for category in Category::ALL {
            *self.slot(category) = pct;
        }
    }

    pub fn set(&mut self, category: Category, pct: f64) {
        *self.slot(category) = percent(pct);
    }

    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for category in Category::ALL {
            let v = out.get(category);
            *out.slot(category) = percent(v);
        }
        out
    }
}
