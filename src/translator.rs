//! Active catalogue and language selection
//!
//! A [`Translator`] holds the catalogue currently in use. Switching language builds the new
//! catalogue completely before installing it, so concurrent lookups see either the old or the new
//! one, never a mix. A failed load leaves the previous catalogue active.
//!
//! [`Translator`]: struct.Translator.html

use locale_config::Locale;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use super::Error;
use super::args;
use super::catalogue::{Catalogue, LoadOptions};

const EXTENSION: &'static str = ".ts";

/// Holder of the active catalogue.
#[derive(Debug,Default)]
pub struct Translator {
    _active: RwLock<Arc<Catalogue>>,
}

impl Translator {
    /// Create translator with an empty catalogue, i.e. translating to the source language.
    pub fn new() -> Translator { Translator::default() }

    pub fn with_catalogue(catalogue: Catalogue) -> Translator {
        Translator { _active: RwLock::new(Arc::new(catalogue)) }
    }

    /// Get the active catalogue.
    ///
    /// The returned snapshot stays valid even if another catalogue is installed meanwhile.
    pub fn catalogue(&self) -> Arc<Catalogue> {
        self._active.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Make `catalogue` active and return the previous one.
    pub fn install(&self, catalogue: Catalogue) -> Arc<Catalogue> {
        let mut active = self._active.write().unwrap_or_else(PoisonError::into_inner);
        ::std::mem::replace(&mut *active, Arc::new(catalogue))
    }

    /// Go back to the source language.
    pub fn remove(&self) -> Arc<Catalogue> {
        self.install(Catalogue::default())
    }

    /// Translate a message with the active catalogue.
    ///
    /// See [`Catalogue::lookup`](../catalogue/struct.Catalogue.html#method.lookup).
    pub fn translate(&self, context: &str, source: &str, comment: Option<&str>, count: Option<u64>)
        -> String
    {
        self.catalogue().lookup(context, source, comment, count).to_owned()
    }

    /// Translate a numerus message and replace `%n` in it with the count.
    pub fn translate_n(&self, context: &str, source: &str, comment: Option<&str>, n: u64) -> String {
        args::substitute_count(&self.translate(context, source, comment, Some(n)), n).into_owned()
    }

    /// Load and install the catalogue for a language.
    ///
    /// Looks for `<prefix><language>.ts` in `dir`, see [`find_catalogue`](fn.find_catalogue.html).
    /// Without `language`, or with an empty one, uses the languages the user prefers for messages.
    ///
    /// Returns `true` if a catalogue was installed. If there is none for the language, the
    /// translator falls back to the source language and returns `false`. A catalogue that fails to
    /// load is an error and the active catalogue stays as it was.
    pub fn load_language<P: AsRef<Path>>(&self, dir: P, prefix: &str, language: Option<&str>,
                                         options: &LoadOptions) -> Result<bool, Error>
    {
        let languages: Vec<String> = match language {
            Some(l) if !l.is_empty() => vec![l.to_owned()],
            _ => Locale::user_default().tags_for("messages")
                .map(|t| t.as_ref().to_owned())
                .collect(),
        };
        match find_catalogue(dir.as_ref(), prefix, &languages) {
            Some(path) => {
                let catalogue = Catalogue::open_with(&path, options)?;
                self.install(catalogue);
                Ok(true)
            }
            None => {
                debug!(dir = %dir.as_ref().display(), ?languages, "no catalogue, using source language");
                self.remove();
                Ok(false)
            }
        }
    }
}

/// File name stems tried for a language tag, most specific first.
///
/// `vi-VN` gives `vi_VN`, `vi_vn` and `vi`.
pub fn candidates(tag: &str) -> Vec<String> {
    let tag = tag.replace('-', "_");
    let mut res = vec![tag.clone()];
    let lower = tag.to_lowercase();
    if lower != tag {
        res.push(lower);
    }
    if let Some(i) = tag.find('_') {
        res.push(tag[..i].to_owned());
    }
    res
}

/// Find the catalogue for the first of `languages` that has one.
pub fn find_catalogue<S: AsRef<str>>(dir: &Path, prefix: &str, languages: &[S]) -> Option<PathBuf> {
    for lang in languages.iter().map(AsRef::as_ref).filter(|l| !l.is_empty()) {
        for stem in candidates(lang) {
            let path = dir.join(format!("{}{}{}", prefix, stem, EXTENSION));
            if path.is_file() {
                debug!(language = %lang, path = %path.display(), "found catalogue");
                return Some(path);
            }
        }
    }
    None
}

/// List languages that have a catalogue in `dir`, sorted.
pub fn available_languages<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Vec<String>, Error> {
    let mut res = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::Io(0, e))? {
        let entry = entry.map_err(|e| Error::Io(0, e))?;
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(n) => n,
            None => continue,
        };
        if name.len() > prefix.len() + EXTENSION.len()
            && name.starts_with(prefix) && name.ends_with(EXTENSION)
        {
            res.push(name[prefix.len()..name.len() - EXTENSION.len()].to_owned());
        }
    }
    res.sort();
    Ok(res)
}

lazy_static!{
    static ref GLOBAL: Translator = Translator::new();
}

/// Process-wide translator. Starts with an empty catalogue.
pub fn global() -> &'static Translator { &GLOBAL }

/// Translate a message with the process-wide translator.
pub fn tr(context: &str, source: &str) -> String {
    GLOBAL.translate(context, source, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::{tempdir, TempDir};

    const VI: &'static str = r#"<TS version="2.1" language="vi_VN">
<context><name>CompatDB</name>
<message><source>Submitting</source><translation>Đang gửi</translation></message>
<message numerus="yes"><source>%n file(s)</source>
<translation><numerusform>%n tệp</numerusform></translation></message>
</context>
</TS>"#;

    const RU: &'static str = r#"<TS version="2.1" language="ru_RU">
<context><name>CompatDB</name>
<message><source>Submitting</source><translation>Отправка</translation></message>
</context>
</TS>"#;

    fn languages_dir() -> TempDir {
        let dir = tempdir().unwrap();
        for &(name, text) in &[("yuzu_vi_VN.ts", VI), ("yuzu_ru.ts", RU), ("yuzu_broken.ts", "<TS><context>"),
                               ("README.md", "")] {
            File::create(dir.path().join(name)).unwrap().write_all(text.as_bytes()).unwrap();
        }
        dir
    }

    #[test]
    fn candidate_names() {
        assert_eq!(candidates("vi-VN"), vec!["vi_VN", "vi_vn", "vi"]);
        assert_eq!(candidates("pt_BR"), vec!["pt_BR", "pt_br", "pt"]);
        assert_eq!(candidates("ru"), vec!["ru"]);
    }

    #[test]
    fn finding_catalogues() {
        let dir = languages_dir();
        let found = |langs: &[&str]| find_catalogue(dir.path(), "yuzu_", langs)
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned());
        assert_eq!(found(&["vi-VN"]), Some("yuzu_vi_VN.ts".to_owned()));
        assert_eq!(found(&["ru-RU"]), Some("yuzu_ru.ts".to_owned()));
        assert_eq!(found(&["de", "", "ru"]), Some("yuzu_ru.ts".to_owned()));
        assert_eq!(found(&["vi"]), None);
        assert_eq!(found(&[]), None);
    }

    #[test]
    fn listing_languages() {
        let dir = languages_dir();
        assert_eq!(available_languages(dir.path(), "yuzu_").unwrap(), vec!["broken", "ru", "vi_VN"]);
        match available_languages(dir.path().join("missing"), "yuzu_") {
            Err(Error::Io(0, _)) => (),
            r => panic!("unexpected result {:?}", r),
        }
    }

    #[test]
    fn switching_languages() {
        let dir = languages_dir();
        let t = Translator::new();
        let options = LoadOptions::new();
        assert_eq!(t.translate("CompatDB", "Submitting", None, None), "Submitting");

        assert!(t.load_language(dir.path(), "yuzu_", Some("vi_VN"), &options).unwrap());
        let snapshot = t.catalogue();
        assert_eq!(t.translate("CompatDB", "Submitting", None, None), "Đang gửi");
        assert_eq!(t.translate_n("CompatDB", "%n file(s)", None, 3), "3 tệp");

        assert!(t.load_language(dir.path(), "yuzu_", Some("ru"), &options).unwrap());
        assert_eq!(t.translate("CompatDB", "Submitting", None, None), "Отправка");
        assert_eq!(snapshot.translate("CompatDB", "Submitting"), "Đang gửi");

        assert!(t.load_language(dir.path(), "yuzu_", Some("broken"), &options).is_err());
        assert_eq!(t.translate("CompatDB", "Submitting", None, None), "Отправка");

        assert!(!t.load_language(dir.path(), "yuzu_", Some("de_DE"), &options).unwrap());
        assert_eq!(t.translate("CompatDB", "Submitting", None, None), "Submitting");
        assert_eq!(t.translate_n("CompatDB", "%n file(s)", None, 1), "1 file(s)");
    }

    #[test]
    fn install_and_remove() {
        let t = Translator::with_catalogue(VI.parse().unwrap());
        let previous = t.install(RU.parse().unwrap());
        assert_eq!(previous.translate("CompatDB", "Submitting"), "Đang gửi");
        assert_eq!(t.remove().translate("CompatDB", "Submitting"), "Отправка");
        assert!(t.catalogue().is_empty());
    }

    #[test]
    fn global_translator() {
        assert_eq!(tr("CompatDB", "Submitting"), "Submitting");
        global().install(VI.parse().unwrap());
        assert_eq!(tr("CompatDB", "Submitting"), "Đang gửi");
        global().remove();
        assert_eq!(tr("CompatDB", "Submitting"), "Submitting");
    }
}
