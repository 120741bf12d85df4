// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Localized reply templates (Arabic, English, French).
//!
//! Text uses WhatsApp markup: `*bold*`, `_italic_`.

use tajer_core::types::{Language, Order, OrderStatus, Product};

use crate::state::ProductRef;

fn price(value: f64) -> String {
    format!("{value:.2}")
}

pub fn greeting(lang: Language, shop: &str, returning: bool) -> String {
    match (lang, returning) {
        (Language::Ar, false) => format!(
            "مرحبا! أهلا بك في *{shop}* 👋\nاكتب اسم المنتج الذي تبحث عنه، أو أرسل *المنتجات* لرؤية كل ما لدينا."
        ),
        (Language::Ar, true) => format!(
            "أهلا بعودتك إلى *{shop}*! 👋\nشو بتحب تطلب اليوم؟ اكتب اسم المنتج أو أرسل *المنتجات*."
        ),
        (Language::Fr, false) => format!(
            "Bonjour et bienvenue chez *{shop}* 👋\nÉcrivez le nom d'un produit, ou envoyez *produits* pour voir le catalogue."
        ),
        (Language::Fr, true) => format!(
            "Bon retour chez *{shop}* ! 👋\nQue souhaitez-vous commander aujourd'hui ? Écrivez un produit ou envoyez *produits*."
        ),
        (Language::En, false) => format!(
            "Hello and welcome to *{shop}* 👋\nType the name of a product, or send *products* to see the catalog."
        ),
        (Language::En, true) => format!(
            "Welcome back to *{shop}*! 👋\nWhat would you like today? Type a product name or send *products*."
        ),
    }
}

pub fn help(lang: Language) -> &'static str {
    match lang {
        Language::Ar => {
            "يمكنك:\n• كتابة اسم منتج للبحث عنه (مثلا: قلم أزرق)\n• إرسال *المنتجات* لتصفح الكتالوج\n• إرسال *طلباتي* لرؤية طلباتك\n• إرسال *إلغاء* لإيقاف الطلب الحالي"
        }
        Language::Fr => {
            "Vous pouvez :\n• écrire un produit pour le chercher (ex. : stylo bleu)\n• envoyer *produits* pour parcourir le catalogue\n• envoyer *mes commandes* pour voir vos commandes\n• envoyer *annuler* pour arrêter la commande en cours"
        }
        Language::En => {
            "You can:\n• type a product to search for it (e.g. blue pen)\n• send *products* to browse the catalog\n• send *my orders* to see your orders\n• send *cancel* to stop the current order"
        }
    }
}

/// Which list a page belongs to; catalog pages can also go back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    SearchResults,
    Catalog,
}

pub fn product_page(
    lang: Language,
    kind: ListKind,
    items: &[ProductRef],
    page: usize,
    page_count: usize,
) -> String {
    let heading = match (lang, kind) {
        (Language::Ar, ListKind::SearchResults) => "هذا ما وجدناه",
        (Language::Ar, ListKind::Catalog) => "منتجاتنا",
        (Language::Fr, ListKind::SearchResults) => "Voici ce que nous avons trouvé",
        (Language::Fr, ListKind::Catalog) => "Notre catalogue",
        (Language::En, ListKind::SearchResults) => "Here is what we found",
        (Language::En, ListKind::Catalog) => "Our catalog",
    };
    let page_label = match lang {
        Language::Ar => format!("صفحة {page}/{page_count}"),
        Language::Fr | Language::En => format!("page {page}/{page_count}"),
    };

    let mut text = format!("{heading} ({page_label}):\n");
    for (i, item) in items.iter().enumerate() {
        text.push_str(&format!("{}. {} - {}\n", i + 1, item.name, price(item.price)));
    }

    text.push('\n');
    text.push_str(match lang {
        Language::Ar => "أرسل رقم المنتج لاختياره.",
        Language::Fr => "Envoyez le numéro du produit pour le choisir.",
        Language::En => "Reply with the product number to choose it.",
    });
    if page < page_count {
        text.push_str(match lang {
            Language::Ar => " أرسل *التالي* للمزيد.",
            Language::Fr => " Envoyez *suivant* pour la suite.",
            Language::En => " Send *next* for more.",
        });
    }
    if kind == ListKind::Catalog && page > 1 {
        text.push_str(match lang {
            Language::Ar => " أرسل *السابق* للرجوع.",
            Language::Fr => " Envoyez *précédent* pour revenir.",
            Language::En => " Send *previous* to go back.",
        });
    }
    text
}

pub fn confirm_product(lang: Language, product: &Product) -> String {
    let (name, value, stock) = (&product.name, price(product.price), product.quantity);
    match lang {
        Language::Ar => format!(
            "*{name}*\nالسعر: {value}\nالمتوفر: {stock}\n\nأرسل *1* لتأكيد الطلب، أو اكتب اسم منتج آخر."
        ),
        Language::Fr => format!(
            "*{name}*\nPrix : {value}\nEn stock : {stock}\n\nEnvoyez *1* pour commander, ou écrivez un autre produit."
        ),
        Language::En => format!(
            "*{name}*\nPrice: {value}\nIn stock: {stock}\n\nReply *1* to order it, or type another product."
        ),
    }
}

pub fn confirm_reminder(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "أرسل *1* للتأكيد، أو اكتب اسم منتج آخر.",
        Language::Fr => "Envoyez *1* pour confirmer, ou écrivez un autre produit.",
        Language::En => "Reply *1* to confirm, or type another product.",
    }
}

pub fn invalid_selection(lang: Language, max: usize) -> String {
    match lang {
        Language::Ar => format!("الرجاء اختيار رقم بين 1 و {max}."),
        Language::Fr => format!("Veuillez choisir un numéro entre 1 et {max}."),
        Language::En => format!("Please choose a number between 1 and {max}."),
    }
}

pub fn out_of_stock(lang: Language, name: &str) -> String {
    match lang {
        Language::Ar => format!("عذرا، *{name}* غير متوفر حاليا. اختر منتجا آخر."),
        Language::Fr => format!("Désolé, *{name}* est en rupture de stock. Choisissez un autre produit."),
        Language::En => format!("Sorry, *{name}* is out of stock. Please choose another product."),
    }
}

pub fn ask_quantity(lang: Language, name: &str, max: i64) -> String {
    match lang {
        Language::Ar => format!("كم قطعة من *{name}* تريد؟ (1 - {max})"),
        Language::Fr => format!("Combien de *{name}* voulez-vous ? (1 - {max})"),
        Language::En => format!("How many *{name}* would you like? (1 - {max})"),
    }
}

pub fn quantity_not_a_number(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "الرجاء إرسال الكمية كرقم (مثلا: 2).",
        Language::Fr => "Veuillez envoyer la quantité en chiffres (ex. : 2).",
        Language::En => "Please send the quantity as a number (e.g. 2).",
    }
}

pub fn quantity_too_low(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "الكمية يجب أن تكون 1 على الأقل.",
        Language::Fr => "La quantité doit être d'au moins 1.",
        Language::En => "The quantity must be at least 1.",
    }
}

pub fn quantity_above_stock(lang: Language, stock: i64) -> String {
    match lang {
        Language::Ar => format!("عذرا، لدينا {stock} قطعة فقط. أرسل كمية أقل."),
        Language::Fr => format!("Désolé, il ne reste que {stock} en stock. Envoyez une quantité plus petite."),
        Language::En => format!("Sorry, only {stock} left in stock. Please send a smaller quantity."),
    }
}

pub fn quantity_above_max(lang: Language, max: i64) -> String {
    match lang {
        Language::Ar => format!("الحد الأقصى للطلب الواحد هو {max} قطعة."),
        Language::Fr => format!("La quantité maximale par commande est de {max}."),
        Language::En => format!("The maximum quantity per order is {max}."),
    }
}

pub fn ask_name(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "ما اسمك الكامل؟",
        Language::Fr => "Quel est votre nom complet ?",
        Language::En => "What is your full name?",
    }
}

pub fn name_too_short(lang: Language, min: usize) -> String {
    match lang {
        Language::Ar => format!("الاسم قصير جدا. الرجاء إرسال {min} أحرف على الأقل."),
        Language::Fr => format!("Ce nom est trop court. Au moins {min} caractères, s'il vous plaît."),
        Language::En => format!("That name is too short. Please send at least {min} characters."),
    }
}

pub fn ask_address(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "ما هو عنوان التوصيل؟",
        Language::Fr => "Quelle est votre adresse de livraison ?",
        Language::En => "What is your delivery address?",
    }
}

pub fn address_too_short(lang: Language, min: usize) -> String {
    match lang {
        Language::Ar => format!("العنوان قصير جدا. الرجاء إرسال {min} أحرف على الأقل."),
        Language::Fr => format!("Cette adresse est trop courte. Au moins {min} caractères, s'il vous plaît."),
        Language::En => format!("That address is too short. Please send at least {min} characters."),
    }
}

pub fn ask_email(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "ما هو بريدك الإلكتروني؟ (أرسل *لا* للتخطي)",
        Language::Fr => "Quelle est votre adresse e-mail ? (envoyez *non* pour passer)",
        Language::En => "What is your email address? (send *skip* to skip)",
    }
}

pub fn invalid_email(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "هذا البريد الإلكتروني غير صالح. أرسله مجددا أو أرسل *لا* للتخطي.",
        Language::Fr => "Cette adresse e-mail n'est pas valide. Renvoyez-la ou envoyez *non* pour passer.",
        Language::En => "That email doesn't look valid. Send it again or send *skip*.",
    }
}

pub fn order_confirmed(lang: Language, order: &Order) -> String {
    let lines: Vec<String> = order
        .items
        .iter()
        .map(|item| format!("• {} x {}", item.quantity, item.product_name))
        .collect();
    let (id, lines, total) = (order.id, lines.join("\n"), price(order.total));
    match lang {
        Language::Ar => format!(
            "✅ تم تسجيل طلبك رقم *{id}*\n{lines}\nالمجموع: *{total}*\nشكرا لك! سنتواصل معك قريبا."
        ),
        Language::Fr => format!(
            "✅ Commande *{id}* enregistrée\n{lines}\nTotal : *{total}*\nMerci ! Nous vous contacterons bientôt."
        ),
        Language::En => format!(
            "✅ Order *{id}* confirmed\n{lines}\nTotal: *{total}*\nThank you! We will contact you soon."
        ),
    }
}

pub fn not_in_stock(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "عذرا، هذا المنتج غير متوفر لدينا حاليا.",
        Language::Fr => "Désolé, nous n'avons pas ce produit en stock.",
        Language::En => "Sorry, we don't have that product in stock.",
    }
}

pub fn not_understood(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "عذرا، لم أفهم. اكتب اسم منتج أو أرسل *مساعدة*.",
        Language::Fr => "Désolé, je n'ai pas compris. Écrivez un produit ou envoyez *aide*.",
        Language::En => "Sorry, I didn't understand. Type a product name or send *help*.",
    }
}

pub fn generic_error(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "عذرا، حدث خطأ. الرجاء المحاولة مجددا بعد قليل.",
        Language::Fr => "Désolé, une erreur s'est produite. Veuillez réessayer dans un instant.",
        Language::En => "Sorry, something went wrong. Please try again in a moment.",
    }
}

pub fn flow_cancelled(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "تم الإلغاء. اكتب اسم منتج متى شئت.",
        Language::Fr => "C'est annulé. Écrivez un produit quand vous voulez.",
        Language::En => "Cancelled. Type a product whenever you're ready.",
    }
}

pub fn numeric_in_idle(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "لا توجد قائمة للاختيار منها. اكتب اسم المنتج الذي تبحث عنه.",
        Language::Fr => "Il n'y a rien à sélectionner. Écrivez le nom du produit recherché.",
        Language::En => "There is nothing to select. Type the name of the product you're looking for.",
    }
}

pub fn empty_catalog(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "الكتالوج فارغ حاليا.",
        Language::Fr => "Le catalogue est vide pour le moment.",
        Language::En => "The catalog is empty right now.",
    }
}

fn status_label(lang: Language, status: OrderStatus) -> &'static str {
    match (lang, status) {
        (Language::Ar, OrderStatus::Pending) => "قيد التنفيذ",
        (Language::Ar, OrderStatus::Cancelled) => "ملغى",
        (Language::Ar, OrderStatus::Completed) => "مكتمل",
        (Language::Fr, OrderStatus::Pending) => "en cours",
        (Language::Fr, OrderStatus::Cancelled) => "annulée",
        (Language::Fr, OrderStatus::Completed) => "livrée",
        (Language::En, OrderStatus::Pending) => "pending",
        (Language::En, OrderStatus::Cancelled) => "cancelled",
        (Language::En, OrderStatus::Completed) => "completed",
    }
}

pub fn order_history(lang: Language, orders: &[Order]) -> String {
    let mut text = match lang {
        Language::Ar => "طلباتك الأخيرة:\n".to_string(),
        Language::Fr => "Vos dernières commandes :\n".to_string(),
        Language::En => "Your recent orders:\n".to_string(),
    };
    for (i, order) in orders.iter().enumerate() {
        let date = order.created_at.get(..10).unwrap_or(&order.created_at);
        text.push_str(&format!(
            "{}. #{} - {} - {} ({})\n",
            i + 1,
            order.id,
            date,
            price(order.total),
            status_label(lang, order.status)
        ));
    }
    text.push('\n');
    text.push_str(match lang {
        Language::Ar => "أرسل رقم الطلب لإلغائه.",
        Language::Fr => "Envoyez le numéro d'une commande pour l'annuler.",
        Language::En => "Reply with an order number to cancel it.",
    });
    text
}

pub fn no_orders(lang: Language) -> &'static str {
    match lang {
        Language::Ar => "ليس لديك أي طلبات بعد.",
        Language::Fr => "Vous n'avez encore aucune commande.",
        Language::En => "You don't have any orders yet.",
    }
}

pub fn order_cancelled(lang: Language, id: i64) -> String {
    match lang {
        Language::Ar => format!("تم إلغاء الطلب رقم *{id}*."),
        Language::Fr => format!("La commande *{id}* a été annulée."),
        Language::En => format!("Order *{id}* has been cancelled."),
    }
}

pub fn order_not_cancellable(lang: Language, id: i64, status: OrderStatus) -> String {
    let status = status_label(lang, status);
    match lang {
        Language::Ar => format!("لا يمكن إلغاء الطلب رقم *{id}* (الحالة: {status})."),
        Language::Fr => format!("La commande *{id}* ne peut pas être annulée (statut : {status})."),
        Language::En => format!("Order *{id}* can't be cancelled (status: {status})."),
    }
}

pub fn faq_hours(lang: Language, hours: &str) -> String {
    match lang {
        Language::Ar => format!("🕒 أوقات العمل: {hours}"),
        Language::Fr => format!("🕒 Nos horaires : {hours}"),
        Language::En => format!("🕒 Opening hours: {hours}"),
    }
}

pub fn faq_location(lang: Language, address: &str) -> String {
    match lang {
        Language::Ar => format!("📍 عنواننا: {address}"),
        Language::Fr => format!("📍 Notre adresse : {address}"),
        Language::En => format!("📍 You can find us at: {address}"),
    }
}

pub fn faq_delivery(lang: Language, info: &str) -> String {
    match lang {
        Language::Ar => format!("🚚 التوصيل: {info}"),
        Language::Fr => format!("🚚 Livraison : {info}"),
        Language::En => format!("🚚 Delivery: {info}"),
    }
}

pub fn faq_contact(lang: Language, phone: &str) -> String {
    match lang {
        Language::Ar => format!("📞 للتواصل: {phone}"),
        Language::Fr => format!("📞 Pour nous joindre : {phone}"),
        Language::En => format!("📞 You can reach us at: {phone}"),
    }
}
