//! Element queries and selector synthesis.
//!
//! [`ElementQuery`] is the platform-neutral question the resolver asks a
//! device ("an element whose text equals X"); [`ElementQuery::to_wire`] turns
//! it into a WebDriver locator strategy. [`synthesize_selector`] goes the
//! other way: from a found element's attributes to a stable XPath worth
//! persisting.

use serde::{Deserialize, Serialize};

use crate::core::types::Platform;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// Attributes read from a located element.
///
/// Field names are platform neutral: on iOS `resource_id` holds `name`,
/// `content_desc` holds `label` and `text` holds `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ElementAttributes {
    fn class_or_any(&self) -> &str {
        non_blank(&self.class_name).unwrap_or("*")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Attribute names a platform exposes for each neutral field.
#[derive(Debug, Clone, Copy)]
pub struct AttributeNames {
    pub class_name: &'static str,
    pub resource_id: &'static str,
    pub content_desc: &'static str,
    pub text: &'static str,
    pub hint: &'static str,
}

pub fn attribute_names(platform: Platform) -> AttributeNames {
    match platform {
        Platform::Android => AttributeNames {
            class_name: "class",
            resource_id: "resource-id",
            content_desc: "content-desc",
            text: "text",
            hint: "hint",
        },
        Platform::Ios => AttributeNames {
            class_name: "type",
            resource_id: "name",
            content_desc: "label",
            text: "value",
            hint: "placeholderValue",
        },
    }
}

/// Which attribute a synthesized selector is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectorAnchor {
    Identifier,
    Description,
    Text,
    ClassOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesizedSelector {
    pub anchor: SelectorAnchor,
    pub expression: String,
}

/// Build the most stable selector the attributes allow.
///
/// Preference: identifier, then description, then text, then bare class.
/// Returns `None` only when the element exposed nothing at all.
pub fn synthesize_selector(
    platform: Platform,
    attrs: &ElementAttributes,
) -> Option<SynthesizedSelector> {
    let names = attribute_names(platform);
    let class = attrs.class_or_any();
    let anchored = [
        (SelectorAnchor::Identifier, names.resource_id, &attrs.resource_id),
        (SelectorAnchor::Description, names.content_desc, &attrs.content_desc),
        (SelectorAnchor::Text, names.text, &attrs.text),
    ];
    for (anchor, attribute, value) in anchored {
        if let Some(value) = non_blank(value) {
            return Some(SynthesizedSelector {
                anchor,
                expression: format!("//{class}[@{attribute}={}]", xpath_literal(value)),
            });
        }
    }
    non_blank(&attrs.class_name).map(|class| SynthesizedSelector {
        anchor: SelectorAnchor::ClassOnly,
        expression: format!("//{class}"),
    })
}

/// Quote a string as an XPath 1.0 literal, using `concat()` when it holds
/// both quote kinds.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Platform-neutral element lookup the resolver issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementQuery {
    DescriptionEquals(String),
    IdEquals(String),
    TextEquals(String),
    /// Case-insensitive substring of the visible text.
    TextContains(String),
    /// Case-insensitive substring of the accessibility description.
    DescriptionContains(String),
    ClassWithText { class: String, text: String },
    /// Every interactive or editable element on screen.
    Interactive,
}

/// WebDriver `using`/`value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireLocator {
    pub using: &'static str,
    pub value: String,
}

impl WireLocator {
    fn xpath(value: String) -> Self {
        Self {
            using: "xpath",
            value,
        }
    }
}

impl ElementQuery {
    pub fn to_wire(&self, platform: Platform) -> WireLocator {
        let names = attribute_names(platform);
        match self {
            ElementQuery::DescriptionEquals(value) => WireLocator {
                using: "accessibility id",
                value: value.clone(),
            },
            ElementQuery::IdEquals(value) => WireLocator {
                using: "id",
                value: value.clone(),
            },
            ElementQuery::TextEquals(value) => {
                let literal = xpath_literal(value);
                match platform {
                    Platform::Android => WireLocator::xpath(format!("//*[@text={literal}]")),
                    Platform::Ios => {
                        WireLocator::xpath(format!("//*[@label={literal} or @value={literal}]"))
                    }
                }
            }
            ElementQuery::TextContains(value) => {
                let attribute = match platform {
                    Platform::Android => names.text,
                    Platform::Ios => names.content_desc,
                };
                WireLocator::xpath(contains_ignore_case(attribute, value))
            }
            ElementQuery::DescriptionContains(value) => {
                let attribute = match platform {
                    Platform::Android => names.content_desc,
                    Platform::Ios => names.resource_id,
                };
                WireLocator::xpath(contains_ignore_case(attribute, value))
            }
            ElementQuery::ClassWithText { class, text } => {
                let attribute = match platform {
                    Platform::Android => names.text,
                    Platform::Ios => names.content_desc,
                };
                WireLocator::xpath(format!("//{class}[@{attribute}={}]", xpath_literal(text)))
            }
            ElementQuery::Interactive => WireLocator::xpath(match platform {
                Platform::Android => "//*[@clickable='true' or @focusable='true' or contains(@class,'EditText')]".to_string(),
                Platform::Ios => IOS_INTERACTIVE_TYPES
                    .iter()
                    .map(|ty| format!("//{ty}"))
                    .collect::<Vec<_>>()
                    .join(" | "),
            }),
        }
    }
}

fn contains_ignore_case(attribute: &str, needle: &str) -> String {
    format!(
        "//*[contains(translate(@{attribute}, '{UPPER}', '{LOWER}'), {})]",
        xpath_literal(&needle.to_lowercase())
    )
}

/// Control classes tried, in order, for the typed-control strategy.
pub fn control_classes(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Android => &[
            "android.widget.Button",
            "android.widget.TextView",
            "android.widget.EditText",
            "android.widget.ImageButton",
            "android.widget.CheckBox",
            "android.widget.Switch",
        ],
        Platform::Ios => &[
            "XCUIElementTypeButton",
            "XCUIElementTypeStaticText",
            "XCUIElementTypeTextField",
            "XCUIElementTypeSecureTextField",
            "XCUIElementTypeCell",
            "XCUIElementTypeSwitch",
        ],
    }
}

const IOS_INTERACTIVE_TYPES: &[&str] = &[
    "XCUIElementTypeButton",
    "XCUIElementTypeTextField",
    "XCUIElementTypeSecureTextField",
    "XCUIElementTypeSearchField",
    "XCUIElementTypeSwitch",
    "XCUIElementTypeCell",
    "XCUIElementTypeLink",
];
