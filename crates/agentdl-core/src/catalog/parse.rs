//! Catalog parser.
//!
//! The vendor page is server-rendered and carries its data as a JSON document
//! in a `<script id="__NEXT_DATA__">` element. The element is located with a
//! lenient pattern and the JSON is walked field by field: a download entry
//! that cannot be understood is skipped with a warning, and only a page whose
//! overall shape is unrecognizable fails the parse.

use std::sync::OnceLock;

use agentdl_schema::{
    Arch, Checksum, ChecksumAlgorithm, OsFamily, OsVersion, PackageRecord, Target, VersionRange,
};
use regex::Regex;
use serde_json::{Map, Value};

use super::Catalog;
use crate::config::CatalogConfig;
use crate::error::ParseError;
use crate::paths::{filename_from_url, is_plain_filename};

const PRODUCTS_POINTER: &str = "/props/pageProps/products";

/// How the numeric suffix of a vendor OS tag reads as a version range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagStyle {
    /// `el8`: major release 8 only.
    Major,
    /// `debian10`: release 10 and later.
    SinceMajor,
    /// `ubuntu1404`: year and month, 14.04 and later.
    SinceYearMonth,
}

/// Vendor OS tag prefixes.
const OS_TAGS: &[(&str, OsFamily, TagStyle)] = &[
    ("el", OsFamily::El, TagStyle::Major),
    ("rhel", OsFamily::El, TagStyle::Major),
    ("amzn", OsFamily::Amzn, TagStyle::Major),
    ("fc", OsFamily::Fedora, TagStyle::Major),
    ("fedora", OsFamily::Fedora, TagStyle::Major),
    ("suse", OsFamily::Suse, TagStyle::Major),
    ("sles", OsFamily::Suse, TagStyle::Major),
    ("debian", OsFamily::Debian, TagStyle::SinceMajor),
    ("raspberrypios", OsFamily::Debian, TagStyle::SinceMajor),
    ("ubuntu", OsFamily::Ubuntu, TagStyle::SinceYearMonth),
    ("darwin", OsFamily::Darwin, TagStyle::SinceMajor),
    ("macos", OsFamily::Darwin, TagStyle::SinceMajor),
    ("macosx", OsFamily::Darwin, TagStyle::SinceMajor),
    ("win", OsFamily::Windows, TagStyle::SinceMajor),
    ("windows", OsFamily::Windows, TagStyle::SinceMajor),
];

fn data_element() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<script\b[^>]*\bid\s*=\s*["']?__NEXT_DATA__["']?[^>]*>(.*?)</script\s*>"#)
            .expect("static regex")
    })
}

fn package_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<version>\d+\.\d+\.\d+)-(?P<platform>[^-]+?)\.(?P<ext>tar\.gz|[^.]+)$")
            .expect("static regex")
    })
}

/// Parse raw page markup into the catalog of the configured product.
///
/// # Errors
///
/// Fails when the data element is absent, its JSON does not decode, there is
/// no product table, no product key starts with `config.product`, or the
/// chosen product has no downloads list. Individual bad entries never fail.
pub fn parse_catalog(markup: &str, config: &CatalogConfig) -> Result<Catalog, ParseError> {
    let raw = data_element()
        .captures(markup)
        .and_then(|c| c.get(1))
        .ok_or(ParseError::MissingDataElement)?;
    let data: Value = serde_json::from_str(raw.as_str().trim())?;

    let products = data
        .pointer(PRODUCTS_POINTER)
        .and_then(Value::as_object)
        .ok_or(ParseError::MissingProducts(PRODUCTS_POINTER))?;

    let (key, product) = products
        .iter()
        .find(|(key, _)| key.starts_with(&config.product))
        .ok_or_else(|| ParseError::ProductNotFound {
            prefix: config.product.clone(),
            available: products.keys().cloned().collect(),
        })?;

    let downloads = product
        .get("downloads")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::MissingDownloads(key.clone()))?;

    let records: Vec<PackageRecord> = downloads
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Some(fields) = entry.as_object() else {
                tracing::warn!(index, "Skipping catalog entry that is not an object");
                return None;
            };
            let record = read_entry(key, fields, config);
            if record.is_none() {
                tracing::warn!(index, name = ?text(fields, "name"), "Skipping catalog entry without a download location");
            }
            record
        })
        .collect();

    tracing::debug!(
        product = %key,
        entries = downloads.len(),
        records = records.len(),
        "Parsed catalog"
    );
    Ok(Catalog::new(key.clone(), records))
}

/// Platform facts read off a package file name.
#[derive(Debug, Default, PartialEq, Eq)]
struct NameFacts {
    version: Option<String>,
    os: Option<String>,
    arch: Option<String>,
}

/// Infer version, OS tag and architecture from names like
/// `NessusAgent-10.6.1-el8.x86_64.rpm` or `NessusAgent-10.6.1-ubuntu1404_amd64.deb`.
fn facts_from_name(name: &str) -> NameFacts {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".dmg") {
        return NameFacts {
            version: captured_version(name),
            os: Some("macosx".to_string()),
            arch: Some("any".to_string()),
        };
    }

    let Some(caps) = package_name().captures(name) else {
        return NameFacts::default();
    };
    let version = Some(caps["version"].to_string());
    let platform = &caps["platform"];

    if caps["ext"].eq_ignore_ascii_case("msi") {
        return NameFacts {
            version,
            os: Some("windows".to_string()),
            arch: Some(platform.to_string()),
        };
    }

    let (os, arch) = match platform.split_once(['.', '_']) {
        Some((os, arch)) => (os, Some(arch.to_string())),
        None => (platform, None),
    };
    NameFacts {
        version,
        os: Some(os.to_string()),
        arch,
    }
}

fn captured_version(name: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").expect("static regex"))
        .find(name)
        .map(|m| m.as_str().to_string())
}

fn read_entry(product: &str, fields: &Map<String, Value>, config: &CatalogConfig) -> Option<PackageRecord> {
    let meta = fields.get("meta_data").and_then(Value::as_object);
    let meta_text = |key: &str| meta.and_then(|m| text(m, key));

    let id = number(fields, "id");
    let name = text(fields, "name").or_else(|| text(fields, "file"));

    let url = ["url", "download_uri"]
        .iter()
        .filter_map(|key| text(fields, key))
        .find(|u| u.starts_with("https://") || u.starts_with("http://"))
        .or_else(|| id.map(|id| config.download_url(id)))?;

    let filename = name
        .clone()
        .filter(|n| is_plain_filename(n))
        .or_else(|| Some(filename_from_url(&url).to_string()).filter(|n| is_plain_filename(n)))?;

    let inferred = facts_from_name(&filename);
    let os_tag = meta_text("os")
        .or(inferred.os)
        .unwrap_or_default()
        .to_ascii_lowercase();
    let (os_family, os_version_range) = classify_os_tag(&os_tag);
    let architecture = classify_arch(meta_text("arch").or(inferred.arch).as_deref());

    Some(PackageRecord {
        id,
        product: product.to_string(),
        version: meta_text("version").or(inferred.version),
        expected_checksum: read_checksum(meta, &filename),
        size: number(fields, "size"),
        description: text(fields, "description"),
        os_tag,
        os_family,
        os_version_range,
        architecture,
        url,
        filename,
    })
}

/// Split a vendor OS tag into family and version range.
///
/// Tags outside [`OS_TAGS`] are kept verbatim as unrecognized targets. An
/// entry that names no OS at all never matches a host.
fn classify_os_tag(tag: &str) -> (Target<OsFamily>, VersionRange) {
    if tag.is_empty() {
        return (Target::Unrecognized("unspecified".to_string()), VersionRange::Any);
    }
    if tag == "any" {
        return (Target::Any, VersionRange::Any);
    }

    let prefix_len = tag
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(tag.len());
    let (prefix, digits) = tag.split_at(prefix_len);
    let style = OS_TAGS
        .iter()
        .find(|(known, _, _)| *known == prefix)
        .filter(|_| digits.chars().all(|c| c.is_ascii_digit()));

    let Some((_, family, style)) = style else {
        return (Target::Unrecognized(tag.to_string()), VersionRange::Any);
    };
    if digits.is_empty() {
        return (Target::Exact(*family), VersionRange::Any);
    }
    let Ok(number) = digits.parse::<u64>() else {
        return (Target::Unrecognized(tag.to_string()), VersionRange::Any);
    };

    let range = match style {
        TagStyle::Major => VersionRange::Major(number),
        TagStyle::SinceMajor => VersionRange::Since(OsVersion::new(number, None)),
        TagStyle::SinceYearMonth if digits.len() == 4 => {
            VersionRange::Since(OsVersion::with_minor_width(number / 100, number % 100, 2))
        }
        TagStyle::SinceYearMonth => VersionRange::Since(OsVersion::new(number, None)),
    };
    (Target::Exact(*family), range)
}

fn classify_arch(raw: Option<&str>) -> Target<Arch> {
    match raw.map(str::trim) {
        None | Some("") => Target::Unrecognized("unspecified".to_string()),
        Some(word) if Arch::is_any_word(word) => Target::Any,
        Some(word) => word
            .parse()
            .map_or_else(|_| Target::Unrecognized(word.to_ascii_lowercase()), Target::Exact),
    }
}

/// The strongest published digest. MD5 is read past, never used.
fn read_checksum(meta: Option<&Map<String, Value>>, filename: &str) -> Option<Checksum> {
    let meta = meta?;
    for algorithm in [ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Sha512] {
        let Some(digest) = text(meta, algorithm.as_str()) else {
            continue;
        };
        match Checksum::new(algorithm, &digest) {
            Ok(checksum) => return Some(checksum),
            Err(e) => tracing::warn!(%filename, "Ignoring published {algorithm} digest: {e}"),
        }
    }
    if meta.contains_key("md5") {
        tracing::debug!(%filename, "Only an md5 digest is published; not used for verification");
    }
    None
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<u64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = include_str!("../../tests/fixtures/nessus-agents.html");

    fn page(products: &str) -> String {
        format!(
            r#"<html><body><script id="__NEXT_DATA__" type="application/json">{{"props":{{"pageProps":{{"products":{products}}}}}}}</script></body></html>"#
        )
    }

    fn catalog() -> Catalog {
        parse_catalog(PAGE, &CatalogConfig::default()).unwrap()
    }

    fn by_name<'c>(catalog: &'c Catalog, name: &str) -> &'c PackageRecord {
        catalog.iter().find(|r| r.filename == name).unwrap()
    }

    #[test]
    fn picks_product_by_prefix_and_keeps_page_order() {
        let catalog = catalog();
        assert_eq!(catalog.product, "nessus-agents");
        // Two trailing entries are unusable and skipped
        assert_eq!(catalog.len(), 11);
        let ids: Vec<_> = catalog.iter().filter_map(|r| r.id).collect();
        assert_eq!(ids.first(), Some(&22712));
        assert_eq!(ids.last(), Some(&22708));
        assert!(ids.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn reads_ubuntu_entry_fields() {
        let catalog = catalog();
        let record = by_name(&catalog, "NessusAgent-10.6.1-ubuntu1404_amd64.deb");
        assert_eq!(record.id, Some(22712));
        assert_eq!(record.os_family, Target::Exact(OsFamily::Ubuntu));
        assert_eq!(
            record.os_version_range,
            VersionRange::Since(OsVersion::new(14, Some(4)))
        );
        assert_eq!(record.architecture, Target::Exact(Arch::X86_64));
        assert_eq!(record.size, Some(25_513_220));
        assert_eq!(record.version.as_deref(), Some("10.6.1"));
        assert_eq!(
            record.url,
            "https://www.tenable.com/downloads/api/v1/public/pages/nessus-agents/downloads/22712/download?i_agree_to_tenable_license_agreement=true"
        );
        let checksum = record.expected_checksum.as_ref().unwrap();
        assert_eq!(checksum.algorithm, ChecksumAlgorithm::Sha256);
        assert_eq!(
            checksum.hex(),
            "0ea2f72a7d3a9e7dfcd59712388136fd15f61c310effb22d5b8d8de44314b141"
        );
    }

    #[test]
    fn classifies_rpm_tags_as_exact_major() {
        let catalog = catalog();
        let el8 = by_name(&catalog, "NessusAgent-10.6.1-el8.aarch64.rpm");
        assert_eq!(el8.os_family, Target::Exact(OsFamily::El));
        assert_eq!(el8.os_version_range, VersionRange::Major(8));
        assert_eq!(el8.architecture, Target::Exact(Arch::Aarch64));

        let amzn = by_name(&catalog, "NessusAgent-10.6.1-amzn2.x86_64.rpm");
        assert_eq!(amzn.os_family, Target::Exact(OsFamily::Amzn));
        assert_eq!(amzn.os_version_range, VersionRange::Major(2));
    }

    #[test]
    fn infers_platform_from_file_name_when_metadata_is_silent() {
        let catalog = catalog();
        let dmg = by_name(&catalog, "NessusAgent-10.6.1.dmg");
        assert_eq!(dmg.os_family, Target::Exact(OsFamily::Darwin));
        assert_eq!(dmg.architecture, Target::Any);
        assert_eq!(dmg.version.as_deref(), Some("10.6.1"));

        let msi = by_name(&catalog, "NessusAgent-10.6.1-x64.msi");
        assert_eq!(msi.os_family, Target::Exact(OsFamily::Windows));
        assert_eq!(msi.architecture, Target::Exact(Arch::X86_64));
    }

    #[test]
    fn unknown_tags_and_bad_digests_are_kept_opaque() {
        let catalog = catalog();
        let legacy = by_name(&catalog, "NessusAgent-10.6.1-es8.x86_64.rpm");
        assert_eq!(legacy.os_family, Target::Unrecognized("es8".to_string()));
        assert_eq!(legacy.expected_checksum, None);

        // md5 alone is not a usable digest
        let suse = by_name(&catalog, "NessusAgent-10.6.1-suse15.x86_64.rpm");
        assert_eq!(suse.expected_checksum, None);
        assert_eq!(suse.os_family, Target::Exact(OsFamily::Suse));
    }

    #[test]
    fn file_name_facts() {
        assert_eq!(
            facts_from_name("NessusAgent-10.6.1-el8.x86_64.rpm"),
            NameFacts {
                version: Some("10.6.1".to_string()),
                os: Some("el8".to_string()),
                arch: Some("x86_64".to_string()),
            }
        );
        assert_eq!(
            facts_from_name("NessusAgent-10.6.1-ubuntu1404_amd64.deb").arch.as_deref(),
            Some("amd64")
        );
        assert_eq!(
            facts_from_name("NessusAgent-10.6.1-linux.tar.gz").os.as_deref(),
            Some("linux")
        );
        assert_eq!(facts_from_name("README"), NameFacts::default());
    }

    #[test]
    fn os_tag_styles() {
        assert_eq!(
            classify_os_tag("debian10"),
            (
                Target::Exact(OsFamily::Debian),
                VersionRange::Since(OsVersion::new(10, None))
            )
        );
        assert_eq!(
            classify_os_tag("fc39"),
            (Target::Exact(OsFamily::Fedora), VersionRange::Major(39))
        );
        assert_eq!(
            classify_os_tag("macosx"),
            (Target::Exact(OsFamily::Darwin), VersionRange::Any)
        );
        assert_eq!(
            classify_os_tag(""),
            (Target::Unrecognized("unspecified".to_string()), VersionRange::Any)
        );
        assert_eq!(classify_os_tag("any"), (Target::Any, VersionRange::Any));
        assert_eq!(
            classify_os_tag("el8-fips"),
            (Target::Unrecognized("el8-fips".to_string()), VersionRange::Any)
        );
    }

    #[test]
    fn explicit_url_wins_over_template() {
        let markup = page(
            r#"{"nessus-agents":{"downloads":[{"id":7,"name":"agent-1.0.0-el9.x86_64.rpm","url":"https://mirror.example/agent.rpm"}]}}"#,
        );
        let catalog = parse_catalog(&markup, &CatalogConfig::default()).unwrap();
        assert_eq!(catalog.records()[0].url, "https://mirror.example/agent.rpm");
        assert_eq!(catalog.records()[0].filename, "agent-1.0.0-el9.x86_64.rpm");
    }

    #[test]
    fn filename_falls_back_to_url() {
        let markup = page(
            r#"{"nessus-agents":{"downloads":[{"url":"https://mirror.example/pkg/agent-1.0.0-el9.x86_64.rpm?token=1","meta_data":{"arch":"noarch"}}]}}"#,
        );
        let catalog = parse_catalog(&markup, &CatalogConfig::default()).unwrap();
        let record = &catalog.records()[0];
        assert_eq!(record.filename, "agent-1.0.0-el9.x86_64.rpm");
        assert_eq!(record.os_version_range, VersionRange::Major(9));
        assert_eq!(record.architecture, Target::Any);
    }

    #[test]
    fn missing_data_element_fails() {
        let err = parse_catalog("<html><body>maintenance</body></html>", &CatalogConfig::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingDataElement));
    }

    #[test]
    fn tolerates_attribute_order_and_quoting() {
        let markup = r#"<SCRIPT type=application/json id=__NEXT_DATA__>{"props":{"pageProps":{"products":{"nessus-agents":{"downloads":[]}}}}}</SCRIPT>"#;
        let catalog = parse_catalog(markup, &CatalogConfig::default()).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn invalid_json_fails() {
        let markup = r#"<script id="__NEXT_DATA__">{"props": </script>"#;
        let err = parse_catalog(markup, &CatalogConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn unknown_product_lists_available_keys() {
        let config = CatalogConfig {
            product: "security-center".to_string(),
            ..CatalogConfig::default()
        };
        let err = parse_catalog(PAGE, &config).unwrap_err();
        match err {
            ParseError::ProductNotFound { prefix, available } => {
                assert_eq!(prefix, "security-center");
                assert_eq!(available, vec!["nessus", "nessus-agents"]);
            }
            other => panic!("expected ProductNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_products_and_downloads_fail() {
        let markup = r#"<script id="__NEXT_DATA__">{"props":{"pageProps":{}}}</script>"#;
        assert!(matches!(
            parse_catalog(markup, &CatalogConfig::default()),
            Err(ParseError::MissingProducts(_))
        ));

        let markup = page(r#"{"nessus-agents":{"name":"no downloads"}}"#);
        assert!(matches!(
            parse_catalog(&markup, &CatalogConfig::default()),
            Err(ParseError::MissingDownloads(ref key)) if key == "nessus-agents"
        ));
    }
}
