//! Blog card markup.
//!
//! [`build_article_card`] turns an [`ArticleCard`] into a detached
//! `<article class="blog-card">` element owned by the given [`Document`]. The
//! caller decides where to attach it.

use ego_tree::NodeId;

use crate::dom::Document;
use crate::models::ArticleCard;

/// Label of the footer link pointing back to the post.
pub const READ_MORE_LABEL: &str = "Read on Medium";

/// Separator between the date and the reading time in the meta line.
const META_SEPARATOR: &str = " · ";

/// Build the card element for `article`.
///
/// The card contains, in order: a media block (only when the article has an
/// image), the linked title, the meta line, the excerpt and the footer link.
/// Both links open in a new tab with `rel="noopener"`.
pub fn build_article_card(doc: &mut Document, article: &ArticleCard) -> NodeId {
    let card = element(doc, "article", "blog-card");

    if let Some(image_url) = article.image.as_deref() {
        let media = element(doc, "div", "blog-card__media");
        let image = element(doc, "img", "blog-card__image");
        doc.set_attr(image, "src", image_url);
        doc.set_attr(image, "loading", "lazy");
        doc.set_attr(image, "alt", &article.title);
        doc.append_child(media, image);
        doc.append_child(card, media);
    }

    let title = element(doc, "h3", "blog-card__title");
    let title_link = external_link(doc, &article.link, &article.title);
    doc.append_child(title, title_link);

    let meta = element(doc, "div", "blog-card__meta");
    let meta_text = [article.pub_date.as_str(), article.reading_time.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(META_SEPARATOR);
    doc.set_text_content(meta, &meta_text);

    let excerpt = element(doc, "p", "blog-card__excerpt");
    doc.set_text_content(excerpt, &article.excerpt);

    let footer = element(doc, "div", "blog-card__footer");
    let footer_link = external_link(doc, &article.link, READ_MORE_LABEL);
    doc.set_attr(footer_link, "class", "blog-card__link");
    doc.append_child(footer, footer_link);

    for child in [title, meta, excerpt, footer] {
        doc.append_child(card, child);
    }
    card
}

fn element(doc: &mut Document, name: &str, class: &str) -> NodeId {
    let id = doc.create_element(name);
    doc.set_attr(id, "class", class);
    id
}

fn external_link(doc: &mut Document, href: &str, text: &str) -> NodeId {
    let link = doc.create_element("a");
    doc.set_attr(link, "href", href);
    doc.set_attr(link, "target", "_blank");
    doc.set_attr(link, "rel", "noopener");
    doc.set_text_content(link, text);
    link
}
