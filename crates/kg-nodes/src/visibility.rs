//! Member visibility for gated cards.
//!
//! Two descriptor shapes coexist in stored documents. The legacy shape has
//! `showOnWeb`, `showOnEmail` and `segment`; the current shape has
//! `web.nonMember`, `web.memberSegment` and `email.memberSegment`. Legacy
//! descriptors are migrated in place before use, and the current fields win
//! whenever both are present.
//!
//! Segments are member filters. Two sentinels matter here:
//! [`ALL_MEMBERS_SEGMENT`] matches every member and [`NO_MEMBERS_SEGMENT`]
//! matches nobody.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::render::{RenderOutput, RenderTarget};

/// Segment matching every member.
pub const ALL_MEMBERS_SEGMENT: &str = "status:free,status:-free";
/// Segment matching no member.
pub const NO_MEMBERS_SEGMENT: &str = "";

/// Web visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebVisibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_member: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_segment: Option<String>,
}

/// Email visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVisibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_segment: Option<String>,
}

/// A card's visibility descriptor, in either shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_web: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_on_email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

impl Default for Visibility {
    /// Visible to everyone on the web and in email.
    fn default() -> Self {
        Self {
            web: Some(WebVisibility {
                non_member: Some(true),
                member_segment: Some(ALL_MEMBERS_SEGMENT.to_owned()),
            }),
            email: Some(EmailVisibility {
                member_segment: Some(ALL_MEMBERS_SEGMENT.to_owned()),
            }),
            show_on_web: None,
            show_on_email: None,
            segment: None,
        }
    }
}

impl Visibility {
    /// Descriptor in the legacy shape.
    pub fn legacy(show_on_web: bool, show_on_email: bool, segment: &str) -> Self {
        Self {
            web: None,
            email: None,
            show_on_web: Some(show_on_web),
            show_on_email: Some(show_on_email),
            segment: Some(segment.to_owned()),
        }
    }

    /// Descriptor in the current shape.
    pub fn gated(non_member: bool, web_segment: &str, email_segment: &str) -> Self {
        Self {
            web: Some(WebVisibility {
                non_member: Some(non_member),
                member_segment: Some(web_segment.to_owned()),
            }),
            email: Some(EmailVisibility {
                member_segment: Some(email_segment.to_owned()),
            }),
            show_on_web: None,
            show_on_email: None,
            segment: None,
        }
    }

    /// Parse a stored descriptor, `None` when it is not an object.
    ///
    /// Fields of the wrong type are dropped instead of failing the parse, so
    /// a damaged descriptor reads as a partially specified one.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        match serde_json::from_value(value.clone()) {
            Ok(visibility) => Some(visibility),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping malformed visibility fields");
                Some(Self::from_fields(map))
            }
        }
    }

    fn from_fields(map: &Map<String, Value>) -> Self {
        fn string(map: &Map<String, Value>, key: &str) -> Option<String> {
            map.get(key).and_then(Value::as_str).map(str::to_owned)
        }
        let object = |key: &str| map.get(key).and_then(Value::as_object);
        Self {
            web: object("web").map(|web| WebVisibility {
                non_member: web.get("nonMember").and_then(Value::as_bool),
                member_segment: string(web, "memberSegment"),
            }),
            email: object("email").map(|email| EmailVisibility {
                member_segment: string(email, "memberSegment"),
            }),
            show_on_web: map.get("showOnWeb").and_then(Value::as_bool),
            show_on_email: map.get("showOnEmail").and_then(Value::as_bool),
            segment: string(map, "segment"),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Whether the descriptor still needs [`migrate`](Self::migrate).
    pub fn uses_old_format(&self) -> bool {
        self.email.is_none() || self.web.as_ref().is_none_or(|web| web.non_member.is_none())
    }

    /// Fill the current-shape fields from the legacy ones.
    ///
    /// Existing current-shape values are kept, except the email segment which
    /// is cleared when the legacy descriptor hides the card from email.
    /// Applying it twice gives the same result as applying it once.
    pub fn migrate(&mut self) {
        let show_on_web = self.show_on_web;
        let web = self.web.get_or_insert_with(WebVisibility::default);
        if web.non_member.is_none() {
            web.non_member = show_on_web;
        }
        if web.member_segment.is_none() {
            let segment = if show_on_web == Some(true) {
                ALL_MEMBERS_SEGMENT
            } else {
                NO_MEMBERS_SEGMENT
            };
            web.member_segment = Some(segment.to_owned());
        }

        let segment = self.segment.clone().filter(|s| !s.is_empty());
        let email = self.email.get_or_insert_with(EmailVisibility::default);
        if self.show_on_email == Some(true) {
            if email.member_segment.is_none() {
                email.member_segment =
                    Some(segment.unwrap_or_else(|| ALL_MEMBERS_SEGMENT.to_owned()));
            }
        } else {
            email.member_segment = Some(NO_MEMBERS_SEGMENT.to_owned());
        }
    }

    /// Migrate if the descriptor is in the legacy shape.
    pub fn normalize(&mut self) {
        if self.uses_old_format() {
            self.migrate();
        }
    }

    /// Set every current-shape field still missing to its restrictive value.
    pub fn fill_restrictive(&mut self) {
        let web = self.web.get_or_insert_with(WebVisibility::default);
        web.non_member.get_or_insert(false);
        web.member_segment
            .get_or_insert_with(|| NO_MEMBERS_SEGMENT.to_owned());
        self.email
            .get_or_insert_with(EmailVisibility::default)
            .member_segment
            .get_or_insert_with(|| NO_MEMBERS_SEGMENT.to_owned());
    }

    /// Whether anyone non-member may see the card on the web.
    ///
    /// A missing value counts as `false`.
    pub fn web_non_member(&self) -> bool {
        self.web.as_ref().and_then(|w| w.non_member).unwrap_or(false)
    }

    /// The web segment; a missing value counts as the no-members segment.
    pub fn web_segment(&self) -> &str {
        self.web
            .as_ref()
            .and_then(|w| w.member_segment.as_deref())
            .unwrap_or(NO_MEMBERS_SEGMENT)
    }

    /// The email segment; a missing value counts as the no-members segment.
    pub fn email_segment(&self) -> &str {
        self.email
            .as_ref()
            .and_then(|e| e.member_segment.as_deref())
            .unwrap_or(NO_MEMBERS_SEGMENT)
    }

    /// Whether the descriptor restricts anyone, after migration.
    pub fn is_active(&self) -> bool {
        let mut current = self.clone();
        current.normalize();
        !current.web_non_member()
            || current.web_segment() != ALL_MEMBERS_SEGMENT
            || current.email_segment() != ALL_MEMBERS_SEGMENT
    }
}

/// Read the visibility property of a dataset.
///
/// A missing descriptor is the open default. A present one is migrated, and
/// anything it fails to specify, including malformed fields, resolves to the
/// restrictive value: hidden from non-members and the no-members segment.
pub(crate) fn fill_visibility(data: &Map<String, Value>) -> Visibility {
    let Some(value) = data
        .get(crate::schema::VISIBILITY_PROPERTY)
        .filter(|v| !v.is_null())
    else {
        return Visibility::default();
    };
    let mut visibility = Visibility::from_value(value).unwrap_or_else(|| {
        tracing::debug!(%value, "Visibility descriptor is not an object");
        Visibility::gated(false, NO_MEMBERS_SEGMENT, NO_MEMBERS_SEGMENT)
    });
    visibility.normalize();
    visibility.fill_restrictive();
    visibility
}

/// Gate rendered output behind member visibility.
///
/// Migrates `visibility` in place when it is in the legacy shape. Email
/// output hidden from everyone becomes the empty container; output shown to a
/// segment is wrapped in an element carrying `data-gh-segment`. Web output
/// hidden from everyone becomes the empty container; partially restricted
/// output is wrapped in `kg-gated-block` comments and returned as a raw value.
pub fn render_with_visibility(
    output: RenderOutput,
    visibility: &mut Visibility,
    target: RenderTarget,
) -> RenderOutput {
    visibility.normalize();

    if target == RenderTarget::Email {
        let segment = visibility.email_segment();
        if segment == NO_MEMBERS_SEGMENT {
            return RenderOutput::empty();
        }
        if segment == ALL_MEMBERS_SEGMENT {
            return output;
        }
        return RenderOutput::element(format!(
            r#"<div data-gh-segment="{}">{}</div>"#,
            kg_html::escape_attr(segment),
            output.content
        ));
    }

    let non_member = visibility.web_non_member();
    let segment = visibility.web_segment();
    if !non_member && segment == NO_MEMBERS_SEGMENT {
        return RenderOutput::empty();
    }
    if non_member && segment == ALL_MEMBERS_SEGMENT {
        return output;
    }
    RenderOutput::value(format!(
        "\n<!--kg-gated-block:begin nonMember:{non_member} memberSegment:\"{segment}\" -->{}<!--kg-gated-block:end-->\n",
        output.content
    ))
}

/// Membership status of a signed-in member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Free,
    Paid,
    Comped,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
            Self::Comped => "comped",
        }
    }
}

/// A signed-in member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub status: MemberStatus,
}

/// Whether a reader may see a gated block.
///
/// Anonymous readers see blocks open to non-members. Signed-in members see
/// blocks whose segment matches their status. A segment is a comma-separated
/// list of `status:X` or `status:-X` filters, any of which may match; a
/// segment with no recognised filter blocks everyone.
pub fn can_access_gated_block(non_member: bool, member_segment: &str, member: Option<&Member>) -> bool {
    let Some(member) = member else {
        return non_member;
    };

    let filters: Vec<(bool, &str)> = member_segment
        .split(',')
        .filter_map(|filter| filter.trim().strip_prefix("status:"))
        .map(|value| match value.strip_prefix('-') {
            Some(negated) => (true, negated),
            None => (false, value),
        })
        .collect();

    filters
        .iter()
        .any(|(negated, status)| (*status == member.status.as_str()) != *negated)
}
