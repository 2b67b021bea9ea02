//! Roster item types and their roster-query wire shape.

use crate::jid::Jid;
use crate::ns;
use crate::xml::Element;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription state of a roster item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    #[default]
    None,
    To,
    From,
    Both,
    /// Removal marker in a roster push; never stored.
    Remove,
}

impl Subscription {
    /// Wire value of the `subscription` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::To => "to",
            Self::From => "from",
            Self::Both => "both",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subscription {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "to" => Ok(Self::To),
            "from" => Ok(Self::From),
            "both" => Ok(Self::Both),
            "remove" => Ok(Self::Remove),
            other => Err(format!("unknown subscription state: {}", other)),
        }
    }
}

/// One contact in a user's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterItem {
    /// Contact address (bare).
    pub jid: Jid,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Group membership, in order.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Subscription state.
    #[serde(default)]
    pub subscription: Subscription,
}

impl RosterItem {
    /// Create an item with no name, groups or subscription.
    pub fn new(jid: Jid) -> Self {
        Self {
            jid: jid.bare(),
            name: None,
            groups: Vec::new(),
            subscription: Subscription::None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Set the subscription state.
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = subscription;
        self
    }

    /// Whether this item asks for its contact to be removed.
    pub fn is_removal(&self) -> bool {
        self.subscription == Subscription::Remove
    }

    /// Render as a roster-query `<item/>`.
    pub fn to_element(&self) -> Element {
        let mut item = Element::new("item", ns::ROSTER).with_attr("jid", self.jid.to_string());
        if let Some(name) = &self.name {
            item.set_attr("name", name.as_str());
        }
        item.set_attr("subscription", self.subscription.as_str());
        for group in &self.groups {
            item.append_child(Element::new("group", ns::ROSTER).with_text(group.as_str()));
        }
        item
    }

    /// Read a roster-query `<item/>`.
    ///
    /// A missing subscription reads as `none`; a missing or invalid address,
    /// or an unknown subscription value, is an error.
    pub fn from_element(item: &Element) -> Result<Self, String> {
        let jid = item
            .attr("jid")
            .ok_or_else(|| "roster item without jid".to_string())?;
        let jid = Jid::parse(jid).map_err(|e| format!("roster item jid: {}", e))?;

        let subscription = match item.attr("subscription") {
            Some(s) => s.parse()?,
            None => Subscription::None,
        };

        let name = item
            .attr("name")
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let groups = item
            .children()
            .filter(|c| c.is("group", ns::ROSTER))
            .map(|g| g.text().trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();

        Ok(Self {
            jid: jid.bare(),
            name,
            groups,
            subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_element_shape() {
        let item = RosterItem::new(Jid::parse("bob@gw.example.com").unwrap())
            .with_name("Bob")
            .with_group("Friends")
            .with_group("Work")
            .with_subscription(Subscription::Both);

        let el = item.to_element();
        assert!(el.is("item", ns::ROSTER));
        assert_eq!(el.attr("jid"), Some("bob@gw.example.com"));
        assert_eq!(el.attr("name"), Some("Bob"));
        assert_eq!(el.attr("subscription"), Some("both"));
        let groups: Vec<String> = el.children().map(|g| g.text()).collect();
        assert_eq!(groups, vec!["Friends", "Work"]);
    }

    #[test]
    fn test_from_element() {
        let el = Element::parse(
            r#"<item xmlns="jabber:iq:roster" jid="carol@gw/res" name="Carol" subscription="to"><group>A</group><group> </group></item>"#,
        )
        .unwrap();
        let item = RosterItem::from_element(&el).unwrap();
        assert_eq!(item.jid.to_string(), "carol@gw");
        assert_eq!(item.name.as_deref(), Some("Carol"));
        assert_eq!(item.groups, vec!["A"]);
        assert_eq!(item.subscription, Subscription::To);
    }

    #[test]
    fn test_from_element_defaults_and_errors() {
        let el = Element::new("item", ns::ROSTER).with_attr("jid", "dave@gw");
        let item = RosterItem::from_element(&el).unwrap();
        assert_eq!(item.subscription, Subscription::None);
        assert!(item.name.is_none());

        let removal = el.clone().with_attr("subscription", "remove");
        assert!(RosterItem::from_element(&removal).unwrap().is_removal());

        assert!(RosterItem::from_element(&Element::new("item", ns::ROSTER)).is_err());
        let bogus = el.with_attr("subscription", "sometimes");
        assert!(RosterItem::from_element(&bogus).is_err());
    }
}
