//! PubMed efetch XML parser using quick-xml
//!
//! Streaming parser for the `PubmedArticleSet` payload returned by the
//! efetch phase. Only the fields the canonical record needs are pulled out;
//! a malformed article is skipped without aborting the batch.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Raw article fields as they appear in the XML, before normalization.
#[derive(Debug, Default)]
pub struct PubmedArticle {
    pub pmid: String,
    pub doi: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub journal_title: Option<String>,
    /// Four candidate date locations; the transform takes the first
    /// populated one, in this order.
    pub article_date: Option<PartialDate>,
    pub journal_pub_date: Option<PartialDate>,
    pub date_completed: Option<PartialDate>,
    pub date_revised: Option<PartialDate>,
    pub authors: Vec<Author>,
    pub mesh_terms: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Author {
    pub last_name: Option<String>,
    pub fore_name: Option<String>,
    pub initials: Option<String>,
}

/// Year/month/day triple where any component may be missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartialDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn is_populated(&self) -> bool {
        self.year.is_some()
    }
}

/// Parse a full efetch response into articles.
///
/// Per-article failures are logged at debug level and skipped.
pub fn parse_efetch_xml(xml: &str) -> Result<Vec<PubmedArticle>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"PubmedArticle" => {
                match parse_article(&mut reader) {
                    Ok(article) => articles.push(article),
                    Err(e) => log::debug!("pubmed: failed to parse article: {e}"),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("efetch XML parse error"),
            _ => {}
        }
        buf.clear();
    }

    Ok(articles)
}

/// Collect the text content of the current element up to `end`, flattening
/// inline markup (`<i>`, `<sub>`, ...) to its text.
fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut parts: Vec<String> = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(t) => parts.push(t.unescape()?.into_owned()),
            Event::CData(c) => parts.push(String::from_utf8_lossy(&c.into_inner()).into_owned()),
            Event::End(e) if e.name().as_ref() == end => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(parts.join(" "))
}

fn parse_article(reader: &mut Reader<&[u8]>) -> Result<PubmedArticle> {
    let mut article = PubmedArticle::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => parse_medline_citation(reader, &mut article)?,
                b"PubmedData" => parse_pubmed_data(reader, &mut article)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(article)
}

fn parse_medline_citation(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                // PMIDs also appear inside CommentsCorrections; keep the first
                b"PMID" if article.pmid.is_empty() => {
                    article.pmid = read_text(reader, b"PMID")?;
                }
                b"DateCompleted" => {
                    article.date_completed = Some(parse_partial_date(reader, b"DateCompleted")?)
                }
                b"DateRevised" => {
                    article.date_revised = Some(parse_partial_date(reader, b"DateRevised")?)
                }
                b"Article" => parse_article_element(reader, article)?,
                b"MeshHeadingList" => article.mesh_terms = parse_mesh_list(reader)?,
                b"KeywordList" => article.keywords.extend(parse_keyword_list(reader)?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_element(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Journal" => parse_journal(reader, article)?,
                b"ArticleTitle" => article.title = Some(read_text(reader, b"ArticleTitle")?),
                b"Abstract" => article.abstract_text = Some(parse_abstract(reader)?),
                b"AuthorList" => article.authors = parse_author_list(reader)?,
                b"ArticleDate" => {
                    article.article_date = Some(parse_partial_date(reader, b"ArticleDate")?)
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_journal(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Title" => article.journal_title = Some(read_text(reader, b"Title")?),
                b"PubDate" => {
                    article.journal_pub_date = Some(parse_partial_date(reader, b"PubDate")?)
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Journal" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_partial_date(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<PartialDate> {
    let mut date = PartialDate::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => date.year = read_text(reader, b"Year")?.parse().ok(),
                b"Month" => date.month = parse_month(&read_text(reader, b"Month")?),
                b"Day" => date.day = read_text(reader, b"Day")?.parse().ok(),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == end => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(date)
}

/// Month element carries either a number or a three-letter name.
fn parse_month(s: &str) -> Option<u32> {
    match s.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => match s.to_lowercase().as_str() {
            "jan" => Some(1),
            "feb" => Some(2),
            "mar" => Some(3),
            "apr" => Some(4),
            "may" => Some(5),
            "jun" => Some(6),
            "jul" => Some(7),
            "aug" => Some(8),
            "sep" => Some(9),
            "oct" => Some(10),
            "nov" => Some(11),
            "dec" => Some(12),
            _ => None,
        },
    }
}

/// Abstracts may be split into labeled sections; labeled sections render as
/// "LABEL: text" and all sections join with a space.
fn parse_abstract(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut sections: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"AbstractText" => {
                let mut label = String::new();
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"Label" {
                        label = String::from_utf8_lossy(&attr.value).to_string();
                    }
                }
                let text = read_text(reader, b"AbstractText")?;
                if text.is_empty() {
                    continue;
                }
                if label.is_empty() {
                    sections.push(text);
                } else {
                    sections.push(format!("{label}: {text}"));
                }
            }
            Event::End(e) if e.name().as_ref() == b"Abstract" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sections.join(" "))
}

fn parse_author_list(reader: &mut Reader<&[u8]>) -> Result<Vec<Author>> {
    let mut authors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Author" => {
                authors.push(parse_author(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"AuthorList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(authors)
}

fn parse_author(reader: &mut Reader<&[u8]>) -> Result<Author> {
    let mut author = Author::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"LastName" => author.last_name = Some(read_text(reader, b"LastName")?),
                b"ForeName" => author.fore_name = Some(read_text(reader, b"ForeName")?),
                b"Initials" => author.initials = Some(read_text(reader, b"Initials")?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Author" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(author)
}

fn parse_mesh_list(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut terms = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"DescriptorName" => {
                let term = read_text(reader, b"DescriptorName")?;
                if !term.is_empty() {
                    terms.push(term);
                }
            }
            Event::End(e) if e.name().as_ref() == b"MeshHeadingList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(terms)
}

fn parse_keyword_list(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut keywords = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Keyword" => {
                let kw = read_text(reader, b"Keyword")?;
                if !kw.is_empty() {
                    keywords.push(kw);
                }
            }
            Event::End(e) if e.name().as_ref() == b"KeywordList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(keywords)
}

fn parse_pubmed_data(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"ArticleId" => {
                let mut id_type = String::new();
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"IdType" {
                        id_type = String::from_utf8_lossy(&attr.value).to_string();
                    }
                }
                let value = read_text(reader, b"ArticleId")?;
                if id_type == "doi" && !value.is_empty() {
                    article.doi = Some(value);
                }
            }
            Event::End(e) if e.name().as_ref() == b"PubmedData" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}
