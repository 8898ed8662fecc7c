use reqwest::Method;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// An HTML form as a browser would submit it.
#[derive(Debug, Clone)]
pub(crate) struct Form {
    pub id: Option<String>,
    pub action: Url,
    pub method: Method,
    pub fields: Vec<(String, String)>,
}

impl Form {
    /// Every form on the page whose action resolves against `page_url`.
    pub fn all(html: &str, page_url: &Url) -> Vec<Form> {
        let document = Html::parse_document(html);
        let form_sel = Selector::parse("form").unwrap();

        document
            .select(&form_sel)
            .filter_map(|form| {
                let action = match form.value().attr("action").map(str::trim) {
                    Some(action) if !action.is_empty() => page_url
                        .join(action)
                        .inspect_err(|e| log::debug!("Skipping form with action {action:?}: {e}"))
                        .ok()?,
                    _ => page_url.clone(),
                };
                let method = match form.value().attr("method") {
                    Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
                    _ => Method::GET,
                };

                Some(Form {
                    id: form.value().attr("id").map(str::to_string),
                    action,
                    method,
                    fields: form_fields(form),
                })
            })
            .collect()
    }

    /// Sets a field, adding it when the form has no control of that name.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }
}

/// Successful controls of a form, in document order. Buttons are left out
/// since nothing is clicked; unchecked boxes are not submitted.
fn form_fields(form: ElementRef) -> Vec<(String, String)> {
    let control_sel = Selector::parse("input[name], select[name], textarea[name]").unwrap();
    let option_sel = Selector::parse("option").unwrap();

    let mut fields = Vec::new();
    for control in form.select(&control_sel) {
        let el = control.value();
        let Some(name) = el.attr("name") else {
            continue;
        };
        if el.attr("disabled").is_some() {
            continue;
        }

        let value = match el.name() {
            "select" => {
                let options: Vec<ElementRef> = control.select(&option_sel).collect();
                let chosen = options
                    .iter()
                    .find(|o| o.value().attr("selected").is_some())
                    .or(options.first());
                match chosen {
                    Some(option) => option
                        .value()
                        .attr("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| option.text().collect::<String>().trim().to_string()),
                    None => continue,
                }
            }
            "textarea" => control.text().collect(),
            _ => {
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "button" | "reset" | "image" | "file" => continue,
                    "checkbox" | "radio" if el.attr("checked").is_none() => continue,
                    "checkbox" | "radio" => el.attr("value").unwrap_or("on").to_string(),
                    _ => el.attr("value").unwrap_or_default().to_string(),
                }
            }
        };

        fields.push((name.to_string(), value));
    }
    fields
}
