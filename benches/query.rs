use compact_str::CompactString;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use taxq::diag::NullDiagnostics;
use taxq::docbuilder::TaxonomyDocument;
use taxq::factory::RelationshipFactory;
use taxq::parser::parse_document;
use taxq::{BasicTaxonomy, EName, RelClass, TaxonomyBase};

const CONCEPTS: usize = 500;

fn synthetic_documents() -> Vec<Arc<TaxonomyDocument>> {
    let mut schema = String::from(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               xmlns:xbrli="http://www.xbrl.org/2003/instance"
               targetNamespace="http://bench.example.com/t">"#,
    );
    for i in 0..CONCEPTS {
        let _ = write!(
            schema,
            r#"<xs:element name="Concept{i}" id="c{i}" substitutionGroup="xbrli:item"/>"#
        );
    }
    schema.push_str("</xs:schema>");

    let mut linkbase = String::from(
        r#"<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
                     xmlns:xlink="http://www.w3.org/1999/xlink">
           <link:presentationLink xlink:type="extended"
                                  xlink:role="http://www.xbrl.org/2003/role/link">"#,
    );
    for i in 0..CONCEPTS {
        let _ = write!(
            linkbase,
            r#"<link:loc xlink:type="locator" xlink:label="l{i}" xlink:href="t.xsd#c{i}"/>"#
        );
    }
    // A flat tree: concept 0 is the parent of everything else
    for i in 1..CONCEPTS {
        let _ = write!(
            linkbase,
            r#"<link:presentationArc xlink:type="arc" xlink:from="l0" xlink:to="l{i}"
                   xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child" order="{i}"/>"#
        );
    }
    linkbase.push_str("</link:presentationLink></link:linkbase>");

    let schema_doc = parse_document("http://bench.example.com/t.xsd", schema.as_bytes()).unwrap();
    let linkbase_doc =
        parse_document("http://bench.example.com/t-pre.xml", linkbase.as_bytes()).unwrap();
    vec![
        Arc::new(TaxonomyDocument::new(
            CompactString::from("http://bench.example.com/t.xsd"),
            Arc::new(schema_doc),
        )),
        Arc::new(TaxonomyDocument::new(
            CompactString::from("http://bench.example.com/t-pre.xml"),
            Arc::new(linkbase_doc),
        )),
    ]
}

fn bench_build_and_query(c: &mut Criterion) {
    let docs = synthetic_documents();

    c.bench_function("extract_relationships", |b| {
        let base = TaxonomyBase::build(docs.clone());
        let factory = RelationshipFactory::new();
        b.iter(|| factory.extract(black_box(&base), &NullDiagnostics).unwrap());
    });

    let base = Arc::new(TaxonomyBase::build(docs));
    let relationships = RelationshipFactory::new()
        .extract(&base, &NullDiagnostics)
        .unwrap();
    let taxonomy = BasicTaxonomy::build(base, HashMap::new(), relationships).unwrap();
    let root = EName::new("http://bench.example.com/t", "Concept0");

    c.bench_function("find_outgoing", |b| {
        b.iter(|| taxonomy.find_outgoing(black_box(&root), RelClass::ParentChild));
    });
}

criterion_group!(benches, bench_build_and_query);
criterion_main!(benches);
