//! Shared page layout, styles and formatting helpers for the HTML pages.

use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, PreEscaped, html};
use numfmt::{Formatter, Precision};

use crate::{endpoints, money::Cents};

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-blue-500 \
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

pub const BUTTON_SECONDARY_STYLE: &str = "py-2 px-4 text-sm font-medium \
    text-gray-900 bg-white rounded border border-gray-200 \
    hover:bg-gray-100 hover:text-blue-700 dark:bg-gray-800 \
    dark:text-gray-400 dark:border-gray-600 dark:hover:text-white \
    dark:hover:bg-gray-700";

pub const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 \
    dark:text-red-500 dark:hover:text-red-400 underline bg-transparent \
    border-none cursor-pointer";

// Form styles
pub const FORM_CONTAINER_STYLE: &str = "flex flex-col gap-4 w-full max-w-md \
    text-gray-900 dark:text-white";
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";
pub const FORM_CHECKBOX_STYLE: &str = "h-4 w-4 rounded-xs text-blue-600 border-gray-300";

// Table styles
pub const TABLE_STYLE: &str = "w-full text-sm text-left rtl:text-right \
    text-gray-500 dark:text-gray-400";

pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

// Badge style
pub const BADGE_STYLE: &str = "inline-flex items-center px-2.5 py-0.5 \
    text-xs font-semibold text-blue-800 bg-blue-100 rounded-full \
    dark:bg-blue-900 dark:text-blue-300";

// Card style
pub const CARD_STYLE: &str = "w-full p-4 bg-white rounded-lg shadow \
    dark:bg-gray-800 dark:border dark:border-gray-700";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center gap-6 px-6 py-8 mx-auto max-w-screen-xl lg:py-5 \
    text-gray-900 dark:text-white";

/// The htmx library, loaded from a CDN.
const HTMX_SCRIPT_URL: &str = "https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js";
/// The htmx extension for swapping error responses into a different target.
const HTMX_RESPONSE_TARGETS_SCRIPT_URL: &str =
    "https://unpkg.com/htmx-ext-response-targets@2.0.4/dist/response-targets.js";
/// The charting library used by the dashboard and reports pages.
pub const ECHARTS_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";
/// The Tailwind CSS play CDN which compiles the utility classes in the browser.
const TAILWIND_SCRIPT_URL: &str = "https://cdn.tailwindcss.com";

/// Extra elements to place in a page's `<head>`.
pub enum HeadElement {
    /// The file path or URL to a JavaScript script.
    ScriptLink(String),
    /// Inline JavaScript.
    ScriptSource(PreEscaped<String>),
    /// CSS rules.
    Style(PreEscaped<String>),
}

/// The layout every page is rendered into.
pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Fintrack" }

                script src=(TAILWIND_SCRIPT_URL) {}
                script src=(HTMX_SCRIPT_URL) {}
                script src=(HTMX_RESPONSE_TARGETS_SCRIPT_URL) {}

                style
                {
                    r#"
                    #indicator.htmx-indicator {
                        display: none;
                    }

                    #indicator.htmx-request .htmx-indicator {
                        display: inline;
                    }

                    #indicator.htmx-request.htmx-indicator {
                        display: inline;
                    }

                    /* Keep chart tooltips below the fixed bottom nav, but above page content. */
                    .echarts-tooltip {
                        z-index: 30 !important;
                    }
                    "#
                }

                @for element in head_elements
                {
                    @match element
                    {
                        HeadElement::ScriptLink(path) => script src=(path) {}
                        HeadElement::ScriptSource(source) => script { (source) }
                        HeadElement::Style(text) => style { (text) }
                    }
                }

                script src={ (endpoints::STATIC) "/app.js" } defer {}
            }

            body
                hx-ext="response-targets"
                class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900 pb-[calc(5rem+env(safe-area-inset-bottom))] lg:pb-0"
            {
                (content)

                // Error alerts from the API are swapped in here.
                div
                    id="alert-container"
                    class="w-full max-w-md px-4"
                    style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
                {}
            }
        }
    }
}

pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    // Template adapted from https://flowbite.com/blocks/marketing/404/
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold
                            lg:text-9xl text-blue-600 dark:text-blue-500"
                    {
                        (header)
                    }

                    p
                        class="mb-4 text-3xl md:text-4xl tracking-tight
                            font-bold text-gray-900 dark:text-white"
                    {
                        (description)
                    }

                    p
                        class="mb-4 text-1xl md:text-2xl tracking-tight
                            text-gray-900 dark:text-white"
                    {
                        (fix)
                    }

                    a
                        href=(endpoints::ROOT)
                        class="inline-flex text-white bg-blue-600
                            hover:bg-blue-800 focus:ring-4 focus:outline-hidden
                            focus:ring-blue-300 font-medium rounded text-sm px-5
                            py-2.5 text-center dark:focus:ring-blue-900 my-4"
                    {
                        "Back to Homepage"
                    }
                }
            }
        }
    );

    base(title, &[], &content)
}

/// The centred card layout shared by the log in and registration pages.
pub fn log_in_register(form_title: &str, form: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            a href=(endpoints::ROOT) class="flex items-center mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                "Fintrack"
            }

            div class="w-full bg-white rounded-lg shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                    {
                        (form_title)
                    }

                    (form)
                }
            }
        }
    }
}

/// A labelled form input.
///
/// `input_type` is the HTML input type, e.g. "text", "email" or "date".
pub fn labelled_input(
    label: &str,
    name: &str,
    input_type: &str,
    value: Option<&str>,
    required: bool,
) -> Markup {
    let id = format!("{name}-input");

    html! {
        div
        {
            label for=(id) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(input_type)
                name=(name)
                id=(id)
                value=[value]
                required[required]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// A labelled input for a currency amount, pre-filled with `value` if given.
pub fn amount_input(label: &str, name: &str, value: Option<Cents>, required: bool) -> Markup {
    let id = format!("{name}-input");
    let value = value.map(crate::money::cents_to_decimal_string);

    html! {
        div
        {
            label for=(id) class=(FORM_LABEL_STYLE) { (label) }

            div class="input-wrapper w-full"
            {
                input
                    type="number"
                    name=(name)
                    id=(id)
                    step="0.01"
                    min="0"
                    placeholder="0.00"
                    value=[value]
                    required[required]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

/// A labelled checkbox that submits `true` when checked.
pub fn checkbox_input(label: &str, name: &str, checked: bool) -> Markup {
    let id = format!("{name}-input");

    html! {
        div class="flex items-center gap-x-3"
        {
            input type="checkbox" name=(name) id=(id) value="true" checked[checked]
                class=(FORM_CHECKBOX_STYLE);

            label for=(id) class="block text-sm font-medium text-gray-900 dark:text-white"
            {
                (label)
            }
        }
    }
}

/// A labelled drop-down. `options` are `(value, label)` pairs.
pub fn select_input(
    label: &str,
    name: &str,
    options: &[(String, String)],
    selected: Option<&str>,
    required: bool,
) -> Markup {
    let id = format!("{name}-input");

    html! {
        div
        {
            label for=(id) class=(FORM_LABEL_STYLE) { (label) }

            select name=(name) id=(id) required[required] class=(FORM_TEXT_INPUT_STYLE)
            {
                @if !required {
                    option value="" { "None" }
                }

                @for (value, text) in options {
                    option value=(value) selected[selected == Some(value.as_str())] { (text) }
                }
            }
        }
    }
}

/// A button that sends a DELETE request to `url` after the user confirms.
pub fn delete_button(url: &str, confirm_message: &str) -> Markup {
    html! {
        button
            type="button"
            hx-delete=(url)
            hx-confirm=(confirm_message)
            hx-target-error="#alert-container"
            class=(BUTTON_DELETE_STYLE)
        {
            "Delete"
        }
    }
}

/// A submit button that shows a spinner while the request is in flight.
pub fn submit_button(text: &str) -> Markup {
    html! {
        button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
        {
            span class="inline htmx-indicator" id="indicator"
            {
                (loading_spinner())
            }
            (text)
        }
    }
}

pub fn loading_spinner() -> Markup {
    // Spinner SVG adapted from https://flowbite.com/docs/components/spinner/
    html! {
        svg
            aria-hidden="true"
            role="status"
            class="inline text-white w-4 h-4 me-2 mb-1 animate-spin"
            viewBox="0 0 100 101"
            fill="none"
            xmlns="http://www.w3.org/2000/svg"
        {
            path
                d="M100 50.5908C100 78.2051 77.6142 100.591 50 100.591C22.3858 100.591 0 78.2051 0 50.5908C0 22.9766 22.3858 0.59082 50 0.59082C77.6142 0.59082 100 22.9766 100 50.5908ZM9.08144 50.5908C9.08144 73.1895 27.4013 91.5094 50 91.5094C72.5987 91.5094 90.9186 73.1895 90.9186 50.5908C90.9186 27.9921 72.5987 9.67226 50 9.67226C27.4013 9.67226 9.08144 27.9921 9.08144 50.5908Z"
                fill="#E5E7EB" {}
            path
                d="M93.9676 39.0409C96.393 38.4038 97.8624 35.9116 97.0079 33.5539C95.2932 28.8227 92.871 24.3692 89.8167 20.348C85.8452 15.1192 80.8826 10.7238 75.2124 7.41289C69.5422 4.10194 63.2754 1.94025 56.7698 1.05124C51.7666 0.367541 46.6976 0.446843 41.7345 1.27873C39.2613 1.69328 37.813 4.19778 38.4501 6.62326C39.0873 9.04874 41.5694 10.4717 44.0505 10.1071C47.8511 9.54855 51.7191 9.52689 55.5402 10.0491C60.8642 10.7766 65.9928 12.5457 70.6331 15.2552C75.2735 17.9648 79.3347 21.5619 82.5849 25.841C84.9175 28.9121 86.7997 32.2913 88.1811 35.8758C89.083 38.2158 91.5421 39.6781 93.9676 39.0409Z"
                fill="currentColor" {}
        }
    }
}

/// Returns the CSS styles for adding a dollar sign prefix to number inputs.
/// Used for currency input fields across multiple forms.
pub fn dollar_input_styles() -> HeadElement {
    HeadElement::Style(PreEscaped(
        r#"
        .input-wrapper {
            position: relative;
            display: inline-block;
        }
        .input-wrapper input[type="number"] {
            padding-left: 1.4rem;
        }
        .input-wrapper::before {
            content: '$';
            position: absolute;
            left: 0.6rem;
            top: 50%;
            transform: translateY(-50%);
            pointer-events: none;
        }
        "#
        .to_owned(),
    ))
}

/// Format cents as dollars with thousands separators, e.g. "-$1,234.50".
pub fn format_currency(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Format cents rounded to whole dollars, e.g. "$1,235".
pub fn format_currency_rounded(cents: Cents) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();
    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let whole_dollar_formatter = |prefix: &str| {
        Formatter::currency(prefix)
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(0)))
    };

    let number = (cents as f64 / 100.0).round();

    let formatted = if number < 0.0 {
        NEGATIVE_FMT
            .get_or_init(|| whole_dollar_formatter("-$"))
            .as_ref()
            .map(|formatter| formatter.fmt_string(number.abs()))
    } else if number > 0.0 {
        POSITIVE_FMT
            .get_or_init(|| whole_dollar_formatter("$"))
            .as_ref()
            .map(|formatter| formatter.fmt_string(number))
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        Some("$0".to_owned())
    };

    formatted.unwrap_or_else(|| {
        let rounded = format_currency(number as Cents * 100);
        rounded.trim_end_matches(".00").to_owned()
    })
}

/// Creates a span with `cents` rounded to the nearest dollar and a
/// tooltip (title) that shows the exact amount.
pub fn currency_rounded_with_tooltip(cents: Cents) -> Markup {
    html!(
        span title=(format_currency(cents)) { (format_currency_rounded(cents)) }
    )
}

/// A small coloured dot, e.g. for a category colour.
pub fn color_swatch(color: Option<&str>) -> Markup {
    let color = color.unwrap_or("#888888");

    html!(
        span
            class="inline-block w-3 h-3 mr-2 rounded-full align-middle"
            style={ "background-color: " (color) ";" }
        {}
    )
}
