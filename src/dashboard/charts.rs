//! ECharts configurations for the dashboard and reports pages.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, JsFunction, Tooltip, Trigger,
    },
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::core::{CategoryExpense, MonthlyTotal},
    html::HeadElement,
    money::cents_to_f64,
};

/// A chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// The container a chart is drawn into.
pub(super) fn chart_container(chart: &DashboardChart) -> Markup {
    html! {
        div
            id=(chart.id)
            class="w-full min-h-[380px] rounded dark:bg-gray-100"
        {}
    }
}

/// Initialise each chart once the page has loaded, following the system's
/// light or dark theme.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    if (!chartDom) return;
                    const chart = echarts.init(chartDom);
                    chart.setOption({});

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                    }};
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    HeadElement::ScriptSource(PreEscaped(format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    )))
}

/// A doughnut of expenses per category in each category's colour.
pub(super) fn expenses_by_category_chart(expenses: &[CategoryExpense]) -> DashboardChart {
    let data: Vec<(f64, &str)> = expenses
        .iter()
        .map(|expense| (cents_to_f64(expense.total), expense.category_name.as_str()))
        .collect();
    let colors: Vec<Color> = expenses
        .iter()
        .map(|expense| Color::from(expense.category_color.as_str()))
        .collect();

    let chart = Chart::new()
        .title(Title::new().text("Expenses by category"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom(0))
        .color(colors)
        .series(Pie::new().name("Expenses").radius("60%").data(data));

    DashboardChart {
        id: "expenses-by-category-chart",
        options: chart.to_string(),
    }
}

/// Side by side income and expense bars for each month.
pub(super) fn monthly_totals_chart(totals: &[MonthlyTotal]) -> DashboardChart {
    let labels: Vec<String> = totals.iter().map(|total| total.month.clone()).collect();
    let income: Vec<f64> = totals.iter().map(|total| cents_to_f64(total.income)).collect();
    let expense: Vec<f64> = totals
        .iter()
        .map(|total| cents_to_f64(total.expense))
        .collect();

    let chart = Chart::new()
        .title(Title::new().text("Income vs expenses"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .legend(Legend::new().top("1%").right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .color(vec![Color::from("#16a34a"), Color::from("#dc2626")])
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Income").data(income))
        .series(Bar::new().name("Expenses").data(expense));

    DashboardChart {
        id: "monthly-totals-chart",
        options: chart.to_string(),
    }
}

fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

#[cfg(test)]
mod chart_tests {
    use crate::dashboard::core::{CategoryExpense, MonthlyTotal};

    use super::{charts_script, expenses_by_category_chart, monthly_totals_chart};

    #[test]
    fn category_chart_uses_category_colors() {
        let chart = expenses_by_category_chart(&[CategoryExpense {
            category_id: None,
            category_name: "Uncategorized".to_owned(),
            category_color: "#888888".to_owned(),
            total: 1234,
        }]);

        assert!(chart.options.contains("#888888"), "got {}", chart.options);
        assert!(chart.options.contains("Uncategorized"), "got {}", chart.options);
        assert!(chart.options.contains("12.34"), "got {}", chart.options);
    }

    #[test]
    fn monthly_chart_labels_months() {
        let chart = monthly_totals_chart(&[MonthlyTotal {
            month: "2025-01".to_owned(),
            income: 100_000,
            expense: 25_050,
        }]);

        assert!(chart.options.contains("2025-01"), "got {}", chart.options);
        assert!(chart.options.contains("250.5"), "got {}", chart.options);
    }

    #[test]
    fn script_initialises_every_chart() {
        let charts = [
            expenses_by_category_chart(&[]),
            monthly_totals_chart(&[]),
        ];

        let crate::html::HeadElement::ScriptSource(script) = charts_script(&charts) else {
            panic!("Expected an inline script");
        };

        assert!(script.0.contains("expenses-by-category-chart"));
        assert!(script.0.contains("monthly-totals-chart"));
    }
}
