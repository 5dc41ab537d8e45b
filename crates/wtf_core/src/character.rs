use crate::classes::{class_color_from_index, WowClass, UNKNOWN_CLASS};
use crate::error::Result;
use crate::flavor::Flavor;
use crate::install::WowInstall;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One character directory found under `WTF/Account/<account>/<realm>/<name>`.
///
/// Records are rebuilt on every enumeration and never persisted. Two records
/// with the same `(account, realm, name, flavor)` are not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub account: String,
    pub realm: String,
    pub name: String,
    pub flavor: Flavor,
    /// Resolved class id, `0` when unknown.
    pub class_index: u8,
    /// Display color of the class, empty when unknown.
    pub class_color: String,
    /// Class resolved, or SavedVariables present for an unknown class.
    pub logged: bool,
    /// Modification time of the character directory, epoch milliseconds.
    pub edit_date: i64,
}

impl Character {
    pub fn new(
        account: impl Into<String>,
        realm: impl Into<String>,
        name: impl Into<String>,
        flavor: Flavor,
    ) -> Self {
        Self {
            account: account.into(),
            realm: realm.into(),
            name: name.into(),
            flavor,
            class_index: UNKNOWN_CLASS,
            class_color: String::new(),
            logged: false,
            edit_date: 0,
        }
    }

    pub fn with_class(mut self, class_index: u8) -> Self {
        self.class_index = class_index;
        self.class_color = class_color_from_index(class_index);
        self
    }

    pub fn class(&self) -> Option<WowClass> {
        WowClass::from_index(self.class_index)
    }

    /// `<root>/<flavor>/WTF/Account/<account>`
    pub fn account_dir(&self, install: &WowInstall) -> Result<Utf8PathBuf> {
        Ok(install.account_path(&self.flavor)?.join(&self.account))
    }

    /// `<root>/<flavor>/WTF/Account/<account>/<realm>/<name>`
    pub fn character_dir(&self, install: &WowInstall) -> Result<Utf8PathBuf> {
        Ok(self.account_dir(install)?.join(&self.realm).join(&self.name))
    }

    pub fn same_identity(&self, other: &Character) -> bool {
        self.account == other.account
            && self.realm == other.realm
            && self.name == other.name
            && self.flavor == other.flavor
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}/{}",
            self.flavor, self.account, self.realm, self.name
        )
    }
}
