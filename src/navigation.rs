//! The navigation bar shown at the top of every page, with a bottom bar on small screens.

use maud::{Markup, html};

use crate::{account::AccountId, endpoints};

/// Where a link is shown in the bottom bar on small screens.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    /// A button of its own.
    Primary,
    /// Listed in the "More" menu.
    More,
}

/// A page that can be reached from the navigation bar.
struct Area {
    url: &'static str,
    title: &'static str,
    slot: Slot,
    /// Whether the page shows data for a single account, and so takes the
    /// `account_id` query parameter.
    per_account: bool,
}

const AREAS: [Area; 10] = [
    Area {
        url: endpoints::DASHBOARD_VIEW,
        title: "Dashboard",
        slot: Slot::Primary,
        per_account: true,
    },
    Area {
        url: endpoints::TRANSACTIONS_VIEW,
        title: "Transactions",
        slot: Slot::Primary,
        per_account: true,
    },
    Area {
        url: endpoints::SCHEDULE_VIEW,
        title: "Schedule",
        slot: Slot::Primary,
        per_account: true,
    },
    Area {
        url: endpoints::CATEGORIES_VIEW,
        title: "Categories",
        slot: Slot::More,
        per_account: true,
    },
    Area {
        url: endpoints::CREDIT_CARDS_VIEW,
        title: "Credit cards",
        slot: Slot::More,
        per_account: true,
    },
    Area {
        url: endpoints::GOALS_VIEW,
        title: "Goals",
        slot: Slot::More,
        per_account: true,
    },
    Area {
        url: endpoints::REPORTS_VIEW,
        title: "Reports",
        slot: Slot::More,
        per_account: true,
    },
    Area {
        url: endpoints::ACCOUNTS_VIEW,
        title: "Accounts",
        slot: Slot::More,
        per_account: false,
    },
    Area {
        url: endpoints::PROFILE_VIEW,
        title: "Profile",
        slot: Slot::More,
        per_account: false,
    },
    Area {
        url: endpoints::LOG_OUT,
        title: "Log out",
        slot: Slot::More,
        per_account: false,
    },
];

#[derive(Debug, Clone)]
struct Link {
    path: &'static str,
    href: String,
    title: &'static str,
    slot: Slot,
    per_account: bool,
    is_current: bool,
}

const DESKTOP_LINK_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
    lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
    dark:hover:text-white lg:dark:hover:bg-transparent";
const DESKTOP_CURRENT_LINK_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";

const BOTTOM_ITEM_STYLE: &str = "flex w-full min-w-0 items-center justify-center rounded-lg \
    px-2.5 py-2 text-xs font-semibold leading-tight sm:px-4 sm:text-sm";
const BOTTOM_CURRENT_STYLE: &str =
    "bg-blue-50 text-blue-700 shadow-sm dark:bg-blue-900/30 dark:text-blue-200";
const BOTTOM_IDLE_STYLE: &str = "text-gray-600 hover:bg-blue-50/70 hover:text-blue-700 \
    dark:text-gray-300 dark:hover:bg-blue-900/20 dark:hover:text-blue-200";

const MORE_ITEM_STYLE: &str = "block rounded-lg px-3 py-2";
const MORE_CURRENT_STYLE: &str = "bg-blue-50 text-blue-700 dark:bg-blue-900/30 dark:text-blue-200";
const MORE_IDLE_STYLE: &str = "text-gray-700 hover:bg-gray-100 hover:text-blue-700 \
    dark:text-gray-200 dark:hover:bg-gray-800/80 dark:hover:text-blue-200";

fn state_style(is_current: bool, current: &'static str, idle: &'static str) -> &'static str {
    if is_current { current } else { idle }
}

pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Get the navigation bar.
    ///
    /// The link whose path matches `active_endpoint` is marked as the current page.
    pub fn new(active_endpoint: &str) -> NavBar {
        let links = AREAS
            .iter()
            .map(|area| Link {
                path: area.url,
                href: area.url.to_owned(),
                title: area.title,
                slot: area.slot,
                per_account: area.per_account,
                is_current: area.url != endpoints::LOG_OUT && active_endpoint == area.url,
            })
            .collect();

        NavBar { links }
    }

    /// Keep `account_id` selected when moving between pages that show a single account.
    pub fn with_account(mut self, account_id: AccountId) -> NavBar {
        for link in self.links.iter_mut().filter(|link| link.per_account) {
            link.href = format!("{}?account_id={account_id}", link.path);
        }

        self
    }

    pub fn into_html(self) -> Markup {
        let links = self.links;
        let more_is_active = links
            .iter()
            .any(|link| link.slot == Slot::More && link.is_current);

        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Fintrack"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in &links {
                                li {
                                    a
                                        href=(link.href)
                                        class=(state_style(
                                            link.is_current,
                                            DESKTOP_CURRENT_LINK_STYLE,
                                            DESKTOP_LINK_STYLE,
                                        ))
                                        aria-current=[link.is_current.then_some("page")]
                                    {
                                        (link.title)
                                    }
                                }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    div
                        class="rounded-xl border border-gray-200 bg-white/95
                        shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                    {
                        ul
                            class="grid grid-cols-4 gap-2 px-4 py-3 text-xs font-semibold
                            text-gray-600 dark:text-gray-300"
                            aria-label="Primary"
                        {
                            @for link in links.iter().filter(|link| link.slot == Slot::Primary) {
                                li class="min-w-0" {
                                    a
                                        href=(link.href)
                                        class={
                                            (BOTTOM_ITEM_STYLE) " "
                                            (state_style(link.is_current, BOTTOM_CURRENT_STYLE, BOTTOM_IDLE_STYLE))
                                        }
                                        aria-current=[link.is_current.then_some("page")]
                                    {
                                        span class="truncate" { (link.title) }
                                    }
                                }
                            }

                            li class="min-w-0" {
                                details class="group relative"
                                {
                                    summary
                                        class={
                                            "list-none [&::-webkit-details-marker]:hidden cursor-pointer "
                                            (BOTTOM_ITEM_STYLE) " "
                                            (state_style(more_is_active, BOTTOM_CURRENT_STYLE, BOTTOM_IDLE_STYLE))
                                        }
                                        aria-current=[more_is_active.then_some("page")]
                                    {
                                        span class="truncate" { "More" }
                                    }

                                    div
                                        class="absolute bottom-full right-0 mb-3 w-40 rounded-xl
                                        border border-gray-200 bg-white/95 p-2 shadow-xl
                                        backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                                    {
                                        ul class="flex flex-col gap-1 text-sm font-medium"
                                        {
                                            @for link in links.iter().filter(|link| link.slot == Slot::More) {
                                                li {
                                                    a
                                                        href=(link.href)
                                                        class={
                                                            (MORE_ITEM_STYLE) " "
                                                            (state_style(link.is_current, MORE_CURRENT_STYLE, MORE_IDLE_STYLE))
                                                        }
                                                        aria-current=[link.is_current.then_some("page")]
                                                    {
                                                        (link.title)
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn marks_only_the_current_area() {
        let areas = [
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::CREDIT_CARDS_VIEW,
            endpoints::SCHEDULE_VIEW,
            endpoints::GOALS_VIEW,
            endpoints::REPORTS_VIEW,
            endpoints::ACCOUNTS_VIEW,
            endpoints::PROFILE_VIEW,
        ];

        for area in areas {
            let nav_bar = NavBar::new(area);

            let current: Vec<_> = nav_bar
                .links
                .iter()
                .filter(|link| link.is_current)
                .map(|link| link.path)
                .collect();
            assert_eq!(current, vec![area], "for {area}");
        }
    }

    #[test]
    fn other_pages_mark_nothing() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::LOG_IN_VIEW,
            endpoints::LOG_OUT,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::TRANSACTIONS_API,
        ] {
            let nav_bar = NavBar::new(endpoint);

            assert!(
                nav_bar.links.iter().all(|link| !link.is_current),
                "no link should be current for {endpoint}"
            );
        }
    }

    #[test]
    fn with_account_keeps_account_on_account_pages() {
        let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).with_account(42);

        for link in &nav_bar.links {
            let want_query = matches!(
                link.path,
                endpoints::DASHBOARD_VIEW
                    | endpoints::TRANSACTIONS_VIEW
                    | endpoints::CATEGORIES_VIEW
                    | endpoints::CREDIT_CARDS_VIEW
                    | endpoints::SCHEDULE_VIEW
                    | endpoints::GOALS_VIEW
                    | endpoints::REPORTS_VIEW
            );

            if want_query {
                assert_eq!(link.href, format!("{}?account_id=42", link.path));
            } else {
                assert_eq!(link.href, link.path);
            }
        }
    }

    #[test]
    fn more_menu_is_current_for_secondary_pages() {
        let nav_bar = NavBar::new(endpoints::GOALS_VIEW).into_html();
        let html = Html::parse_fragment(&nav_bar.into_string());
        let summary = html
            .select(&Selector::parse("summary").unwrap())
            .next()
            .expect("No more menu found");

        assert_eq!(summary.value().attr("aria-current"), Some("page"));
    }
}
