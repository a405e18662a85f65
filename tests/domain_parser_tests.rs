//! Integration tests for domain parsing against the fixture suffix list.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use domain_parser_r::{
    parse_rules_from_file, parse_with_store, DomainError, DomainParser, RuleCache, RuleKind,
    RuleStore,
};

fn testdata_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("testdata");
    path.push(filename);
    path
}

fn fixture_store() -> RuleStore {
    parse_rules_from_file(testdata_path("public_suffix_list.dat"))
        .expect("fixture list should load")
}

fn fixture_parser() -> DomainParser {
    DomainParser::new(Arc::new(RuleCache::from_store(fixture_store())))
}

fn assert_parts(parser: &DomainParser, input: &str, sub_domain: &str, sld: &str, tld: &str) {
    let parts = parser
        .parse(input)
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", input, e));
    assert_eq!(parts.sub_domain, sub_domain, "sub domain of {}", input);
    assert_eq!(parts.sld, sld, "sld of {}", input);
    assert_eq!(parts.tld, tld, "tld of {}", input);
}

mod fixture_tests {
    use super::*;

    #[test]
    fn test_fixture_rule_counts() {
        let store = fixture_store();
        assert_eq!(store.len(), 30);
        assert_eq!(store.count(RuleKind::Normal), 15);
        assert_eq!(store.count(RuleKind::Wildcard), 4);
        assert_eq!(store.count(RuleKind::Exception), 11);
    }
}

mod rule_kind_tests {
    use super::*;

    #[test]
    fn test_parse_normal_domain() {
        assert_parts(&fixture_parser(), "photos.totallycool.com", "photos", "totallycool", "com");
    }

    #[test]
    fn test_parse_wildcard_domain() {
        let parser = fixture_parser();
        assert_parts(&parser, "photos.verybritish.co.uk", "photos", "verybritish", "co.uk");
        let parts = parser.parse("photos.verybritish.co.uk").unwrap();
        assert_eq!(parts.matched_rule.name, "uk");
        assert_eq!(parts.rule_kind(), RuleKind::Wildcard);
    }

    #[test]
    fn test_parse_exception_domain() {
        let parser = fixture_parser();
        assert_parts(
            &parser,
            "photos.wishlist.parliament.uk",
            "photos.wishlist",
            "parliament",
            "uk",
        );
        let parts = parser.parse("photos.wishlist.parliament.uk").unwrap();
        assert_eq!(parts.matched_rule.name, "parliament.uk");
    }

    #[test]
    fn test_parse_normal_domain_where_tld_occurs_in_domain() {
        assert_parts(&fixture_parser(), "russian.cntv.cn", "russian", "cntv", "cn");
    }

    #[test]
    fn test_parse_wildcard_domain_where_tld_occurs_in_domain() {
        assert_parts(&fixture_parser(), "com.er.com.er", "com", "er", "com.er");
    }

    #[test]
    fn test_parse_exception_domain_where_tld_occurs_in_subdomain() {
        assert_parts(&fixture_parser(), "www.ck.www.ck", "www.ck", "www", "ck");
    }

    #[test]
    fn test_multi_label_normal_rule_wins_over_shorter() {
        assert_parts(&fixture_parser(), "www.gov.cn", "", "www", "gov.cn");
        assert_parts(&fixture_parser(), "bucket.s3.amazonaws.com", "", "bucket", "s3.amazonaws.com");
        assert_parts(&fixture_parser(), "octocat.github.io", "", "octocat", "github.io");
    }

    #[test]
    fn test_deep_wildcard_and_exception() {
        let parser = fixture_parser();
        assert_parts(&parser, "www.example.kawasaki.jp", "", "www", "example.kawasaki.jp");
        // An exception rule always leaves a single-label TLD, however many
        // labels the exception name itself spans.
        assert_parts(&parser, "foo.city.kawasaki.jp", "foo.city", "kawasaki", "jp");
    }

    #[test]
    fn test_mixed_case_input_keeps_case() {
        assert_parts(
            &fixture_parser(),
            "Photos.VeryBritish.CO.UK",
            "Photos",
            "VeryBritish",
            "CO.UK",
        );
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn test_blank_input_is_invalid_argument() {
        let parser = fixture_parser();
        assert!(matches!(
            parser.parse("   "),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(parser.try_parse("").is_none());
    }

    #[test]
    fn test_unknown_suffix_is_no_matching_rule() {
        let parser = fixture_parser();
        assert!(matches!(
            parser.parse("www.example.zz"),
            Err(DomainError::NoMatchingRule(_))
        ));
        assert!(parser.try_parse("www.example.zz").is_none());
    }

    #[test]
    fn test_trailing_dot_has_no_match() {
        let parser = fixture_parser();
        assert!(matches!(
            parser.parse("example.com."),
            Err(DomainError::NoMatchingRule(_))
        ));
    }
}

mod property_tests {
    use super::*;

    const INPUTS: &[&str] = &[
        "photos.totallycool.com",
        "photos.verybritish.co.uk",
        "photos.wishlist.parliament.uk",
        "russian.cntv.cn",
        "www.ck.www.ck",
        "com.er.com.er",
        "a.b.c.example.kawasaki.jp",
        "x.city.kawasaki.jp",
        "deep.path.to.octocat.github.io",
        "example.com",
    ];

    #[test]
    fn test_reassembly_reproduces_input() {
        let parser = fixture_parser();
        for input in INPUTS {
            let parts = parser.parse(input).unwrap();
            assert_eq!(&parts.to_string(), input);
        }
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let store = fixture_store();
        for input in INPUTS {
            let first = parse_with_store(&store, input).unwrap();
            let second = parse_with_store(&store, &first.to_string()).unwrap();
            assert_eq!(first, second, "re-parse of {}", input);
        }
    }

    #[test]
    fn test_same_generation_is_deterministic() {
        let parser = fixture_parser();
        for input in INPUTS {
            assert_eq!(parser.parse(input).unwrap(), parser.parse(input).unwrap());
        }
    }

    #[test]
    fn test_concurrent_parsing() {
        let parser = Arc::new(fixture_parser());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let parser = parser.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        for input in INPUTS {
                            let parts = parser.parse(input).unwrap();
                            assert_eq!(&parts.to_string(), input);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(parser.cache().rebuild_count(), 1);
    }
}
