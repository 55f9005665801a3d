/// A curated link with a short description, stored in the resources collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub title: &'static str,
    pub content: &'static str,
    pub url: &'static str,
}

pub const CURATED_RESOURCES: &[Resource] = &[
    Resource {
        title: "False Allegations",
        content: "False allegations are a common, serious tactic in contested custody and divorce cases...",
        url: "https://coloradoresilience.org/false-allegations/",
    },
    Resource {
        title: "Parental Alienation Resource",
        content: "Parental Alienation Resource provides timeline and evidence-tracking tools for parents...",
        url: "https://www.parentalalienationresource.com/",
    },
    Resource {
        title: "End to Domestic Violence",
        content: "End to Domestic Violence provides support, guidance, and advocacy for survivors of domestic abuse...",
        url: "https://endtodv.org/",
    },
    Resource {
        title: "Men and Boys Network",
        content: "Men and Boys Network provides resources, counseling, and support for fathers and male caregivers...",
        url: "http://www.menandboys.net/",
    },
];
