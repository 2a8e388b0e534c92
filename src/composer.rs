use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Composers covered by the site, each backed by its own libretto sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Composer {
    Strauss,
    Wagner,
    Mahler,
}

impl Composer {
    pub const ALL: [Composer; 3] = [Composer::Strauss, Composer::Wagner, Composer::Mahler];

    /// Short code, also the name of the libretto sheet
    pub fn code(&self) -> &'static str {
        match self {
            Composer::Strauss => "RS",
            Composer::Wagner => "RW",
            Composer::Mahler => "GM",
        }
    }

    pub fn data_sheet(&self) -> &'static str {
        self.code()
    }

    /// Sheet listing acts and scenes (movements for Mahler) with their names
    pub fn structure_sheet(&self) -> &'static str {
        match self {
            Composer::Strauss => "RS幕構成",
            Composer::Wagner => "RW幕構成",
            Composer::Mahler => "GM楽章構成",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Composer::Strauss => "R.Strauss",
            Composer::Wagner => "R.Wagner",
            Composer::Mahler => "G.Mahler",
        }
    }

    pub fn data_cache_key(&self) -> &'static str {
        match self {
            Composer::Strauss => "richard_strauss_data_v2",
            Composer::Wagner => "richard_wagner_data_v2",
            Composer::Mahler => "gustav_mahler_data_v2",
        }
    }

    pub fn terms_cache_key(&self) -> &'static str {
        match self {
            Composer::Strauss => "rs_de_terms_cache_v2",
            Composer::Wagner => "rw_de_terms_cache_v2",
            Composer::Mahler => "gm_de_terms_cache_v2",
        }
    }

    pub fn scene_map_cache_key(&self) -> String {
        format!("scene_map_{}_v1", self.code().to_lowercase())
    }

    /// Title for a normalized opera key, if the composer has one on file.
    pub fn display_name(&self, opera_key: &str) -> Option<&'static str> {
        let table: &[(&str, &str)] = match self {
            Composer::Strauss => &STRAUSS_OPERAS,
            Composer::Wagner => &WAGNER_OPERAS,
            Composer::Mahler => &[],
        };
        table
            .iter()
            .find(|(key, _)| *key == opera_key)
            .map(|(_, name)| *name)
    }
}

const STRAUSS_OPERAS: [(&str, &str); 15] = [
    ("guntram", "Guntram"),
    ("feuersnot", "Feuersnot"),
    ("salome", "Salome"),
    ("elektra", "Elektra"),
    ("rosenkavalier", "Der Rosenkavalier"),
    ("ariadne", "Ariadne auf Naxos"),
    ("schatten", "Die Frau ohne Schatten"),
    ("intermezzo", "Intermezzo"),
    ("helena", "Die ägyptische Helena"),
    ("arabella", "Arabella"),
    ("schweigsame", "Die schweigsame Frau"),
    ("tag", "Friedenstag"),
    ("daphne", "Daphne"),
    ("danae", "Die Liebe der Danae"),
    ("cap", "Capriccio"),
];

const WAGNER_OPERAS: [(&str, &str); 10] = [
    ("hollander", "Der fliegende Holländer"),
    ("tannhauser", "Tannhäuser"),
    ("lohengrin", "Lohengrin"),
    ("tristan", "Tristan und Isolde"),
    ("meistersinger", "Die Meistersinger von Nürnberg"),
    ("rheingold", "Das Rheingold"),
    ("walkure", "Die Walküre"),
    ("siegfried", "Siegfried"),
    ("gotterdammerung", "Götterdämmerung"),
    ("parsifal", "Parsifal"),
];

impl fmt::Display for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Composer {
    type Err = String;

    /// Accepts the family name or the sheet code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strauss" | "rs" | "richard strauss" => Ok(Composer::Strauss),
            "wagner" | "rw" | "richard wagner" => Ok(Composer::Wagner),
            "mahler" | "gm" | "gustav mahler" => Ok(Composer::Mahler),
            other => Err(format!("unknown composer: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("Strauss".parse::<Composer>(), Ok(Composer::Strauss));
        assert_eq!(" rw ".parse::<Composer>(), Ok(Composer::Wagner));
        assert!("Verdi".parse::<Composer>().is_err());
    }

    #[test]
    fn display_names_are_per_composer() {
        assert_eq!(Composer::Strauss.display_name("cap"), Some("Capriccio"));
        assert_eq!(Composer::Wagner.display_name("cap"), None);
        assert_eq!(Composer::Mahler.display_name("salome"), None);
    }
}
