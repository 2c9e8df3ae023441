//! Loading spinner component

use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct SpinnerProps {
    #[prop_or_default]
    pub text: Option<String>,
}

#[function_component(LoadingSpinner)]
pub fn loading_spinner(props: &SpinnerProps) -> Html {
    html! {
        <span class="inline-flex items-center gap-2">
            <span class="w-4 h-4 border-2 border-gray-200 border-t-blue-500 rounded-full animate-spin"></span>
            if let Some(text) = &props.text {
                <span class="text-gray-600 text-sm">{text}</span>
            }
        </span>
    }
}
