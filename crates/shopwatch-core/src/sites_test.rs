use std::io::Write;

use super::*;

const HEADER: &str = "site_name,url,list_selector,name_selector,price_selector,status_selector,sku_selector,product_url_selector,price_attribute,currency_hint,status_soldout_text,paging_mode,page_param,start_page,max_pages,next_page_selector,sleep_ms,mobile_ua_fallback,platform_hint,enabled";

fn csv_with_rows(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

#[test]
fn minimal_row_gets_documented_defaults() {
    let catalog = parse_sites_csv("site_name,url\nAlpha,https://alpha.example/shop\n").unwrap();

    assert!(catalog.rejected.is_empty(), "{:?}", catalog.rejected);
    assert_eq!(catalog.sites.len(), 1);
    let site = &catalog.sites[0];
    assert_eq!(site.name, "Alpha");
    assert_eq!(site.url.as_str(), "https://alpha.example/shop");
    assert!(matches!(site.pagination, Pagination::Single));
    assert_eq!(site.sleep_ms, DEFAULT_SLEEP_MS);
    assert!(site.mobile_ua_fallback);
    assert!(site.platform_hint.is_none());
    assert!(site.selectors.list.is_none());
    assert!(site.soldout_pattern.is_match("OUT OF STOCK"));
    assert!(site.soldout_pattern.is_match("غير متوفر"));
    assert!(site.currency_pattern.is_match("1,250 egp"));
}

#[test]
fn full_row_is_parsed_into_typed_config() {
    let content = csv_with_rows(&[
        "Beta,https://beta.example/c/phones,li.product,h2,.price,.stock,.sku,a.link@href,data-price,USD,gone,param,p,2,3,,250,no,WooCommerce,yes",
    ]);
    let catalog = parse_sites_csv(&content).unwrap();

    assert!(catalog.rejected.is_empty(), "{:?}", catalog.rejected);
    let site = &catalog.sites[0];
    assert_eq!(site.selectors.list.as_ref().unwrap().as_str(), "li.product");
    assert_eq!(
        site.selectors.price.as_ref().unwrap().attribute(),
        Some("data-price")
    );
    assert_eq!(
        site.selectors.product_url.as_ref().unwrap().attribute(),
        Some("href")
    );
    assert!(site.currency_pattern.is_match("usd"));
    assert!(site.soldout_pattern.is_match("GONE"));
    match &site.pagination {
        Pagination::Param {
            page_param,
            start_page,
            max_pages,
        } => {
            assert_eq!(page_param, "p");
            assert_eq!(*start_page, 2);
            assert_eq!(*max_pages, 3);
        }
        other => panic!("expected Param pagination, got {other:?}"),
    }
    assert_eq!(site.sleep_ms, 250);
    assert!(!site.mobile_ua_fallback);
    assert_eq!(site.platform_hint.as_deref(), Some("woocommerce"));
}

#[test]
fn category_url_alias_is_accepted() {
    let catalog =
        parse_sites_csv("site_name,category_url\nGamma,https://gamma.example/all\n").unwrap();
    assert_eq!(catalog.sites.len(), 1);
    assert_eq!(catalog.sites[0].url.as_str(), "https://gamma.example/all");
}

#[test]
fn leading_bom_is_tolerated() {
    let catalog = parse_sites_csv("\u{feff}site_name,url\nDelta,https://delta.example/\n").unwrap();
    assert_eq!(catalog.sites.len(), 1);
    assert_eq!(catalog.sites[0].name, "Delta");
}

#[test]
fn link_mode_defaults_max_pages_and_keeps_next_selector() {
    let catalog = parse_sites_csv(
        "site_name,url,paging_mode,next_page_selector\nEps,https://eps.example/,link,a.next@href\n",
    )
    .unwrap();
    match &catalog.sites[0].pagination {
        Pagination::Link {
            next_selector,
            max_pages,
        } => {
            assert_eq!(next_selector.as_ref().unwrap().as_str(), "a.next@href");
            assert_eq!(*max_pages, 5);
        }
        other => panic!("expected Link pagination, got {other:?}"),
    }
}

#[test]
fn float_formatted_counts_are_accepted() {
    let catalog = parse_sites_csv(
        "site_name,url,paging_mode,max_pages,start_page\nZeta,https://zeta.example/,param,4.0,1.0\n",
    )
    .unwrap();
    assert_eq!(catalog.sites[0].pagination.max_pages(), 4);
}

#[test]
fn invalid_rows_are_reported_and_skipped() {
    let content = csv_with_rows(&[
        "Good,https://good.example/,,,,,,,,,,,,,,,,,,",
        ",https://noname.example/,,,,,,,,,,,,,,,,,,",
        "BadUrl,not a url,,,,,,,,,,,,,,,,,,",
        "BadSelector,https://bad.example/,div[[,,,,,,,,,,,,,,,,,",
        "BadMode,https://mode.example/,,,,,,,,,,sideways,,,,,,,,",
        "BadRegex,https://regex.example/,,,,,,,,,(unclosed,,,,,,,,,",
        "ZeroPages,https://zero.example/,,,,,,,,,,param,,,0,,,,,",
    ]);
    let catalog = parse_sites_csv(&content).unwrap();

    assert_eq!(catalog.sites.len(), 1);
    assert_eq!(catalog.sites[0].name, "Good");
    assert_eq!(catalog.rejected.len(), 6);

    let rows: Vec<usize> = catalog.rejected.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![2, 3, 4, 5, 6, 7]);
    assert!(catalog.rejected[0].reason.contains("site_name"));
    assert!(catalog.rejected[2].reason.contains("list_selector"));
    assert!(catalog.rejected[3].reason.contains("sideways"));
    assert!(catalog.rejected[4].reason.contains("status_soldout_text"));
    assert!(catalog.rejected[5].reason.contains("max_pages"));
}

#[test]
fn non_http_scheme_is_rejected() {
    let catalog = parse_sites_csv("site_name,url\nFtp,ftp://files.example/\n").unwrap();
    assert!(catalog.sites.is_empty());
    assert!(catalog.rejected[0].reason.contains("http"));
}

#[test]
fn price_attribute_without_price_selector_is_rejected() {
    let catalog = parse_sites_csv(
        "site_name,url,price_attribute\nShop,https://shop.example/,data-price\n",
    )
    .unwrap();
    assert!(catalog.sites.is_empty());
    assert_eq!(catalog.rejected.len(), 1);
    assert_eq!(catalog.rejected[0].site_name, "Shop");
    assert!(catalog.rejected[0].reason.contains("price_selector"));
}

#[test]
fn disabled_rows_are_counted_not_rejected() {
    let catalog = parse_sites_csv(
        "site_name,url,enabled\nOn,https://on.example/,true\nOff,https://off.example/,false\n",
    )
    .unwrap();
    assert_eq!(catalog.sites.len(), 1);
    assert_eq!(catalog.disabled, 1);
    assert!(catalog.rejected.is_empty());
}

#[test]
fn duplicate_site_names_reject_the_later_row() {
    let catalog = parse_sites_csv(
        "site_name,url\nShop,https://one.example/\nshop,https://two.example/\n",
    )
    .unwrap();
    assert_eq!(catalog.sites.len(), 1);
    assert_eq!(catalog.sites[0].url.as_str(), "https://one.example/");
    assert_eq!(catalog.rejected.len(), 1);
    assert!(catalog.rejected[0].reason.contains("duplicate"));
}

#[test]
fn yaml_catalog_accepts_native_scalars() {
    let yaml = r"
sites:
  - site_name: Eta
    url: https://eta.example/collections/all
    paging_mode: param
    max_pages: 2
    sleep_ms: 0
    mobile_ua_fallback: false
  - site_name: Theta
    url: https://theta.example/
    enabled: false
";
    let catalog = parse_sites_yaml(yaml).unwrap();

    assert_eq!(catalog.sites.len(), 1);
    assert_eq!(catalog.disabled, 1);
    let site = &catalog.sites[0];
    assert_eq!(site.pagination.max_pages(), 2);
    assert_eq!(site.sleep_ms, 0);
    assert!(!site.mobile_ua_fallback);
}

#[test]
fn load_sites_dispatches_on_extension() {
    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("sites.csv");
    let mut f = std::fs::File::create(&csv_path).unwrap();
    writeln!(f, "site_name,url\nIota,https://iota.example/").unwrap();
    assert_eq!(load_sites(&csv_path).unwrap().sites.len(), 1);

    let yaml_path = dir.path().join("sites.yml");
    std::fs::write(&yaml_path, "sites:\n  - site_name: Kappa\n    url: https://kappa.example/\n")
        .unwrap();
    assert_eq!(load_sites(&yaml_path).unwrap().sites[0].name, "Kappa");

    let txt_path = dir.path().join("sites.txt");
    std::fs::write(&txt_path, "whatever").unwrap();
    assert!(matches!(
        load_sites(&txt_path),
        Err(ConfigError::UnsupportedCatalogFormat { .. })
    ));
}

#[test]
fn load_sites_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_sites(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, ConfigError::CatalogIo { .. }), "got: {err:?}");
}

#[test]
fn with_defaults_builds_single_page_site() {
    let site = SiteConfig::with_defaults("Lambda", "https://lambda.example/c").unwrap();
    assert!(matches!(site.pagination, Pagination::Single));
    assert!(SiteConfig::with_defaults("Bad", "mailto:x@y").is_err());
}
