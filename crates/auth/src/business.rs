//! Business verticals and their vocabulary.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a business vertical (e.g. `"restaurant"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessTypeId(Cow<'static, str>);

impl BusinessTypeId {
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for BusinessTypeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A business vertical: display data plus a terminology map translating
/// generic nouns (`"item"`, `"branch"`) into vertical-specific ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessType {
    pub id: BusinessTypeId,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub terminology: BTreeMap<String, String>,
}

impl BusinessType {
    pub fn new(id: &'static str, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: BusinessTypeId::new(id),
            name: name.into(),
            icon: icon.into(),
            terminology: BTreeMap::new(),
        }
    }

    pub fn with_term(mut self, generic: &str, specific: &str) -> Self {
        self.terminology.insert(generic.to_string(), specific.to_string());
        self
    }

    /// Vertical vocabulary for `noun`, or the noun itself when unmapped.
    pub fn term<'a>(&'a self, noun: &'a str) -> &'a str {
        self.terminology
            .get(noun)
            .map(String::as_str)
            .unwrap_or(noun)
    }
}

/// Find the catalog entry for `id`.
pub fn resolve_business_type<'a>(
    catalog: &'a [BusinessType],
    id: Option<&BusinessTypeId>,
) -> Option<&'a BusinessType> {
    let id = id?;
    catalog.iter().find(|bt| &bt.id == id)
}

/// Best-effort guess of the vertical from the text of an email address.
///
/// Only meant to fill the gap until the actor's profile loads; the business
/// record is authoritative afterwards. Hyphenated ids also match without the
/// hyphen (`autorepair`) or with `_`/`.` in its place.
pub fn guess_business_type_from_email(
    email: &str,
    catalog: &[BusinessType],
) -> Option<BusinessTypeId> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return None;
    }

    catalog
        .iter()
        .find(|bt| {
            let id = bt.id.as_str();
            email.contains(id)
                || email.contains(&id.replace('-', ""))
                || email.contains(&id.replace('-', "_"))
                || email.contains(&id.replace('-', "."))
        })
        .map(|bt| bt.id.clone())
}

/// The verticals shipped with the product.
pub fn default_catalog() -> Vec<BusinessType> {
    vec![
        BusinessType::new("restaurant", "Restaurant", "utensils")
            .with_term("item", "dish")
            .with_term("customer", "guest")
            .with_term("order", "order"),
        BusinessType::new("hotel", "Hotel", "bed")
            .with_term("item", "room")
            .with_term("branch", "property")
            .with_term("customer", "guest")
            .with_term("order", "booking"),
        BusinessType::new("salon", "Salon", "scissors")
            .with_term("item", "service")
            .with_term("customer", "client")
            .with_term("order", "appointment"),
        BusinessType::new("pharmacy", "Pharmacy", "pill")
            .with_term("item", "medicine")
            .with_term("customer", "patient")
            .with_term("order", "prescription"),
        BusinessType::new("retail", "Retail", "shopping-bag")
            .with_term("item", "product")
            .with_term("branch", "store"),
        BusinessType::new("gym", "Gym", "dumbbell")
            .with_term("item", "plan")
            .with_term("customer", "member")
            .with_term("order", "membership"),
        BusinessType::new("grocery", "Grocery", "shopping-cart")
            .with_term("item", "product")
            .with_term("branch", "store"),
        BusinessType::new("auto-repair", "Auto Repair", "wrench")
            .with_term("item", "part")
            .with_term("customer", "vehicle owner")
            .with_term("order", "job"),
        BusinessType::new("pet-care", "Pet Care", "paw")
            .with_term("item", "service")
            .with_term("customer", "owner")
            .with_term("order", "visit"),
    ]
}
